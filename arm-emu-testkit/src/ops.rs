//! Applies a [`ConstraintCollection`] as a test program's initial state, or
//! asserts it against the state a program stopped in.
//!
//! Grounded on `original_source/ArmEmu/TestConstraints.hpp`'s templated
//! `applyConstraints`/`verifyConstraints` over a `ConstraintInterpretor`;
//! here the interpretor is folded directly into two free functions over
//! `arm_emu_core::Core`, since this crate only ever targets one kind of
//! interpretor (the emulator core itself), not a second real-hardware target
//! the original's template parameter existed to also support.
//!
//! This core has no MMU, so the Physical/Logical distinction in
//! `MemoryKind` is not grounded on anything here: both forms resolve
//! through the same `read_map`/`write_map`.

use arbitrary_int::u4;
use thiserror::Error;

use arm_emu_core::coprocessor::{CoprocRegisterAddress, CoprocResult};
use arm_emu_core::psr::{Cpsr, Spsr};
use arm_emu_core::Core;

use crate::constraint::{mode_from_code, Constraint, Location, MemoryKind, SystemRegister};

const FPA_REGISTER_TRANSFER_SLOT: u8 = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpsError {
    #[error("coprocessor {0} has no slot bound")]
    CoprocessorNotBound(u8),
    #[error("coprocessor {coproc} register {reg} refused the access")]
    CoprocessorRegisterRefused { coproc: u8, reg: u8 },
    #[error("IrqStatus cannot be asserted, only applied as an initial condition")]
    IrqStatusNotAssertable,
}

fn zero_address() -> CoprocRegisterAddress {
    CoprocRegisterAddress {
        opcode: u4::new(0),
        crn: u4::new(0),
        crm: u4::new(0),
        op2: u4::new(0),
    }
}

fn coproc_address(reg: u8) -> CoprocRegisterAddress {
    CoprocRegisterAddress {
        crn: u4::new(reg),
        ..zero_address()
    }
}

// This core has no MMU between the "physical" and "logical" views of an
// address, so PBYTE/PHWORD/PWORD and LBYTE/LHWORD/LWORD constraints resolve
// identically, both through `read_map`/`write_map`.
fn memory_word_at(core: &mut Core, addr: u32) -> u32 {
    core.read_map.read_typed(addr & !0x3).value
}

fn read_memory(core: &mut Core, kind: MemoryKind, addr: u32) -> u32 {
    match kind {
        MemoryKind::PhysicalByte | MemoryKind::LogicalByte => {
            let word = memory_word_at(core, addr);
            (word >> (8 * (addr & 0x3))) & 0xFF
        }
        MemoryKind::PhysicalHalfWord | MemoryKind::LogicalHalfWord => {
            let word = memory_word_at(core, addr);
            (word >> (8 * (addr & 0x2))) & 0xFFFF
        }
        MemoryKind::PhysicalWord | MemoryKind::LogicalWord => memory_word_at(core, addr),
        MemoryKind::Map => unreachable!("Map is handled separately"),
    }
}

fn write_memory(core: &mut Core, kind: MemoryKind, addr: u32, value: u32) {
    match kind {
        MemoryKind::PhysicalByte | MemoryKind::LogicalByte => {
            let aligned = addr & !0x3;
            let shift = 8 * (addr & 0x3);
            let previous = core.write_map.read_typed(aligned).value;
            let mask = 0xFFu32 << shift;
            let merged = (previous & !mask) | ((value & 0xFF) << shift);
            core.write_map.write_typed(aligned, merged);
        }
        MemoryKind::PhysicalHalfWord | MemoryKind::LogicalHalfWord => {
            let aligned = addr & !0x3;
            let shift = 8 * (addr & 0x2);
            let previous = core.write_map.read_typed(aligned).value;
            let mask = 0xFFFFu32 << shift;
            let merged = (previous & !mask) | ((value & 0xFFFF) << shift);
            core.write_map.write_typed(aligned, merged);
        }
        MemoryKind::PhysicalWord | MemoryKind::LogicalWord => {
            core.write_map.write_typed(addr & !0x3, value);
        }
        MemoryKind::Map => {}
    }
}

/// Applies every constraint as the processor/memory state a test program
/// should start in.
pub fn apply_initial(core: &mut Core, constraints: &[Constraint]) -> Result<(), OpsError> {
    for constraint in constraints {
        match constraint.location {
            Location::CoreRegister(n) => core.registers.set(n as usize, constraint.value),
            Location::SystemRegister(SystemRegister::Pc) => core.registers.set_pc(constraint.value),
            Location::SystemRegister(SystemRegister::Cpsr) => core.registers.set_psr(Cpsr::new_with_raw_value(constraint.value)),
            Location::SystemRegister(SystemRegister::Spsr) => core.registers.set_spsr(Spsr::new_with_raw_value(constraint.value)),
            Location::SystemRegister(SystemRegister::Mode) => {
                let mode = mode_from_code(constraint.value).expect("parser only ever emits a valid mode code");
                core.registers.switch_mode(mode);
            }
            Location::SystemRegister(SystemRegister::IrqStatus) => {
                if constraint.value & 0b01 != 0 {
                    core.interrupts.request_irq();
                }
                if constraint.value & 0b10 != 0 {
                    core.interrupts.request_firq();
                }
            }
            Location::SystemRegister(SystemRegister::IrqMask) => {
                let psr = core.registers.get_psr().with_irq_disable(constraint.value & 0b01 != 0).with_firq_disable(constraint.value & 0b10 != 0);
                core.registers.update_psr(psr, true);
            }
            Location::SystemRegister(SystemRegister::Status) => {
                core.registers.set_flags(arm_emu_core::psr::Flags {
                    negative: constraint.value & 0b0001 != 0,
                    zero: constraint.value & 0b0010 != 0,
                    carry: constraint.value & 0b0100 != 0,
                    overflow: constraint.value & 0b1000 != 0,
                });
            }
            Location::Memory { kind, addr } => write_memory(core, kind, addr, constraint.value),
            Location::FpaRegister(n) => {
                let slot = core
                    .coprocessors
                    .slot_mut(u4::new(FPA_REGISTER_TRANSFER_SLOT))
                    .ok_or(OpsError::CoprocessorNotBound(FPA_REGISTER_TRANSFER_SLOT))?;
                match slot.handle_register_to_coproc(coproc_address(n), constraint.value) {
                    CoprocResult::Handled(()) => {}
                    CoprocResult::NotAccepted => {
                        return Err(OpsError::CoprocessorRegisterRefused {
                            coproc: FPA_REGISTER_TRANSFER_SLOT,
                            reg: n,
                        })
                    }
                }
            }
            Location::CoProcRegister { coproc, reg } => {
                let slot = core.coprocessors.slot_mut(u4::new(coproc)).ok_or(OpsError::CoprocessorNotBound(coproc))?;
                match slot.handle_register_to_coproc(coproc_address(reg), constraint.value) {
                    CoprocResult::Handled(()) => {}
                    CoprocResult::NotAccepted => return Err(OpsError::CoprocessorRegisterRefused { coproc, reg }),
                }
            }
        }
    }
    Ok(())
}

/// One constraint that didn't hold once the program stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub location: Location,
    pub expected: u32,
    pub actual: u32,
}

/// Reads every constrained location back out of `core` and reports any
/// that disagree with the recorded value.
pub fn assert_final(core: &mut Core, constraints: &[Constraint]) -> Result<Vec<Mismatch>, OpsError> {
    let mut mismatches = Vec::new();
    for constraint in constraints {
        let actual = match constraint.location {
            Location::CoreRegister(n) => core.registers.get(n as usize),
            Location::SystemRegister(SystemRegister::Pc) => core.registers.get_pc(),
            Location::SystemRegister(SystemRegister::Cpsr) => core.registers.get_psr().raw_value(),
            Location::SystemRegister(SystemRegister::Spsr) => core.registers.get_spsr().raw_value(),
            Location::SystemRegister(SystemRegister::Mode) => crate::constraint::mode_code(core.registers.mode()),
            Location::SystemRegister(SystemRegister::IrqStatus) => return Err(OpsError::IrqStatusNotAssertable),
            Location::SystemRegister(SystemRegister::IrqMask) => {
                let psr = core.registers.get_psr();
                (psr.irq_disable() as u32) | ((psr.firq_disable() as u32) << 1)
            }
            Location::SystemRegister(SystemRegister::Status) => {
                let flags = core.registers.flags();
                (flags.negative as u32) | ((flags.zero as u32) << 1) | ((flags.carry as u32) << 2) | ((flags.overflow as u32) << 3)
            }
            Location::Memory { kind: MemoryKind::Map, addr } => {
                let mapped = core.read_map.try_find(addr).is_some();
                mapped as u32
            }
            Location::Memory { kind, addr } => read_memory(core, kind, addr),
            Location::FpaRegister(n) => {
                let slot = core
                    .coprocessors
                    .slot_mut(u4::new(FPA_REGISTER_TRANSFER_SLOT))
                    .ok_or(OpsError::CoprocessorNotBound(FPA_REGISTER_TRANSFER_SLOT))?;
                match slot.handle_coproc_to_register(coproc_address(n)) {
                    CoprocResult::Handled(value) => value,
                    CoprocResult::NotAccepted => {
                        return Err(OpsError::CoprocessorRegisterRefused {
                            coproc: FPA_REGISTER_TRANSFER_SLOT,
                            reg: n,
                        })
                    }
                }
            }
            Location::CoProcRegister { coproc, reg } => {
                let slot = core.coprocessors.slot_mut(u4::new(coproc)).ok_or(OpsError::CoprocessorNotBound(coproc))?;
                match slot.handle_coproc_to_register(coproc_address(reg)) {
                    CoprocResult::Handled(value) => value,
                    CoprocResult::NotAccepted => return Err(OpsError::CoprocessorRegisterRefused { coproc, reg }),
                }
            }
        };
        if actual != constraint.value {
            mismatches.push(Mismatch {
                location: constraint.location,
                expected: constraint.value,
                actual,
            });
        }
    }
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_emu_core::mem::map::UnmappedPolicy;
    use arm_emu_core::mem::region::{HostBlock, Region};
    use arm_emu_core::mem::AddressMap;
    use arm_emu_core::coprocessor::CoprocessorBus;

    fn test_core() -> Core {
        let mut read_map = AddressMap::new(UnmappedPolicy::default());
        let mut write_map = AddressMap::new(UnmappedPolicy::default());
        let (ram_read, ram_write) = HostBlock::ram_pair(0x1000);
        read_map.try_insert(0x8000, Region::HostBlock(ram_read));
        write_map.try_insert(0x8000, Region::HostBlock(ram_write));
        Core::new(read_map, write_map, CoprocessorBus::new(), false)
    }

    #[test]
    fn applies_and_asserts_core_registers() {
        let mut core = test_core();
        let constraints = crate::parser::parse_constraints("R0=5, R1=0x10").unwrap();
        apply_initial(&mut core, &constraints).unwrap();
        assert_eq!(core.registers.get(0), 5);
        assert_eq!(core.registers.get(1), 0x10);

        let mismatches = assert_final(&mut core, &constraints).unwrap();
        assert!(mismatches.is_empty());
    }

    #[test]
    fn mismatch_is_reported_not_panicked() {
        let mut core = test_core();
        let constraints = crate::parser::parse_constraints("R0=5").unwrap();
        core.registers.set(0, 6);
        let mismatches = assert_final(&mut core, &constraints).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].actual, 6);
        assert_eq!(mismatches[0].expected, 5);
    }

    #[test]
    fn applies_and_reads_back_a_word_in_memory() {
        let mut core = test_core();
        let constraints = crate::parser::parse_constraints("PWORD[0x8000]=0xCAFEBABE").unwrap();
        apply_initial(&mut core, &constraints).unwrap();
        let mismatches = assert_final(&mut core, &constraints).unwrap();
        assert!(mismatches.is_empty());
    }

    #[test]
    fn status_flags_round_trip() {
        let mut core = test_core();
        let constraints = crate::parser::parse_constraints("Status=NzCv").unwrap();
        apply_initial(&mut core, &constraints).unwrap();
        let flags = core.registers.flags();
        assert!(flags.negative);
        assert!(!flags.zero);
        assert!(flags.carry);
        assert!(flags.overflow);
    }
}
