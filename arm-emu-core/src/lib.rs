//! A cycle-counted functional emulator core for the early ARM architecture
//! family (ARMv2 through ARMv4) plus the FPA floating-point coprocessor.
//!
//! The crate is organized bottom-up, each module a self-contained piece of
//! the architecture (`C1`-`C10` in the design ledger): address map, memory
//! regions, the banked register file, the exception engine, the decoder, the
//! ALU/barrel shifter, the data-transfer unit, control flow, the coprocessor
//! bus (with CP15 and FPA bound into it), and finally [`exec`], which ties
//! all of the above into a runnable loop.

pub mod alu;
pub mod condition;
pub mod control_flow;
pub mod coprocessor;
pub mod cp15;
pub mod decode;
pub mod error;
pub mod exception;
pub mod exec;
pub mod fpa;
pub mod mem;
pub mod options;
pub mod psr;
pub mod registers;
pub mod transfer;
pub mod word;

pub use error::{ConfigError, CoreError};
pub use exec::{Core, InterruptBus, Metrics, TerminationReason};
pub use mem::map::{AddressMap, AddressSpace, UnmappedPolicy};
pub use mem::region::{HostBlock, MmioDevice, Region, SystemContext};
pub use options::{EmuOptions, ProcessorModel, SystemModel};

/// Builds the bound coprocessor set a given [`ProcessorModel`] exposes:
/// CP15 at slot 15 from ARMv2a onward, FPA at slots 1/2 when present.
///
/// ARMv2 has no CP15 slot bound at all, so an MRC there hits the
/// undefined-instruction path through an empty slot rather than through any
/// CP15-specific refusal.
pub fn bind_coprocessors(processor: ProcessorModel) -> coprocessor::CoprocessorBus {
    use arbitrary_int::u4;

    let mut bus = coprocessor::CoprocessorBus::new();
    if processor.has_cp15() {
        bus.bind(u4::new(15), Box::new(cp15::Cp15::new()));
    }
    if processor.has_fpa() {
        bus.bind(u4::new(1), Box::new(fpa::Fpa::new()));
        bus.bind(u4::new(2), Box::new(fpa::Fpa::new()));
    }
    bus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm2_has_no_cp15_slot() {
        let mut bus = bind_coprocessors(ProcessorModel::Arm2);
        assert!(bus.slot_mut(arbitrary_int::u4::new(15)).is_none());
    }

    #[test]
    fn arm3fpa_binds_both_cp15_and_fpa() {
        let mut bus = bind_coprocessors(ProcessorModel::Arm3Fpa);
        assert!(bus.slot_mut(arbitrary_int::u4::new(15)).is_some());
        assert!(bus.slot_mut(arbitrary_int::u4::new(1)).is_some());
        assert!(bus.slot_mut(arbitrary_int::u4::new(2)).is_some());
    }
}
