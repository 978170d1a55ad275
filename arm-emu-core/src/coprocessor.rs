//! The coprocessor bus (C9): sixteen numbered slots, each empty or bound to
//! an implementation.
//!
//! Grounded on `cortex-ar/src/register/dfsr.rs`'s `SysReg` trait
//! (`const CP/CRN/OP1/CRM/OP2`), which is the addressing scheme CP15
//! instructions decode into; reused here as the register-address key type a
//! `Coprocessor` implementation is handed, rather than as a register-struct
//! derive macro target (there is no single fixed bit layout to derive here,
//! since each coprocessor defines its own registers).

use arbitrary_int::u4;

use crate::psr::ProcessorMode;

/// Addressing fields common to every coprocessor register access
/// (MRC/MCR/CDP), mirroring `cortex_ar::register::SysReg`'s constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoprocRegisterAddress {
    pub opcode: u4,
    pub crn: u4,
    pub crm: u4,
    pub op2: u4,
}

/// The result of a coprocessor dispatch: either handled, or "not accepted"
/// (slot empty, or the specific register/mode combination is refused),
/// which the caller turns into the undefined-instruction exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoprocResult<T> {
    Handled(T),
    NotAccepted,
}

/// A bound coprocessor implementation.
pub trait Coprocessor {
    fn handle_data_op(&mut self, address: CoprocRegisterAddress) -> CoprocResult<()>;
    fn handle_register_to_coproc(&mut self, address: CoprocRegisterAddress, value: u32) -> CoprocResult<()>;
    fn handle_coproc_to_register(&mut self, address: CoprocRegisterAddress) -> CoprocResult<u32>;
    fn handle_load(&mut self, crd: u4, addr: u32, long: bool) -> CoprocResult<()>;
    fn handle_store(&mut self, crd: u4, addr: u32, long: bool) -> CoprocResult<u32>;

    /// Called by the executor before every dispatch so a coprocessor that
    /// cares about privilege (CP15) can enforce it without the bus handing
    /// out a live register-file reference. Most coprocessors (FPA) ignore it.
    fn sync_mode(&mut self, _mode: ProcessorMode) {}
}

/// Sixteen coprocessor slots, each either empty or bound.
#[derive(Default)]
pub struct CoprocessorBus {
    slots: [Option<Box<dyn Coprocessor>>; 16],
}

impl CoprocessorBus {
    pub fn new() -> Self {
        CoprocessorBus {
            slots: Default::default(),
        }
    }

    pub fn bind(&mut self, slot: u4, coprocessor: Box<dyn Coprocessor>) {
        self.slots[slot.value() as usize] = Some(coprocessor);
    }

    pub fn slot_mut(&mut self, slot: u4) -> Option<&mut (dyn Coprocessor + 'static)> {
        self.slots[slot.value() as usize].as_deref_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        last_value: u32,
    }

    impl Coprocessor for Echo {
        fn handle_data_op(&mut self, _address: CoprocRegisterAddress) -> CoprocResult<()> {
            CoprocResult::Handled(())
        }
        fn handle_register_to_coproc(&mut self, _address: CoprocRegisterAddress, value: u32) -> CoprocResult<()> {
            self.last_value = value;
            CoprocResult::Handled(())
        }
        fn handle_coproc_to_register(&mut self, _address: CoprocRegisterAddress) -> CoprocResult<u32> {
            CoprocResult::Handled(self.last_value)
        }
        fn handle_load(&mut self, _crd: u4, _addr: u32, _long: bool) -> CoprocResult<()> {
            CoprocResult::NotAccepted
        }
        fn handle_store(&mut self, _crd: u4, _addr: u32, _long: bool) -> CoprocResult<u32> {
            CoprocResult::NotAccepted
        }
    }

    #[test]
    fn empty_slot_is_not_accepted() {
        let mut bus = CoprocessorBus::new();
        assert!(bus.slot_mut(u4::new(5)).is_none());
    }

    #[test]
    fn bound_slot_round_trips_a_value() {
        let mut bus = CoprocessorBus::new();
        bus.bind(u4::new(1), Box::new(Echo { last_value: 0 }));
        let addr = CoprocRegisterAddress {
            opcode: u4::new(0),
            crn: u4::new(0),
            crm: u4::new(0),
            op2: u4::new(0),
        };
        let slot = bus.slot_mut(u4::new(1)).unwrap();
        slot.handle_register_to_coproc(addr, 0xABCD);
        assert_eq!(slot.handle_coproc_to_register(addr), CoprocResult::Handled(0xABCD));
    }
}
