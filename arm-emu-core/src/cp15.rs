//! CP15 (system control coprocessor), present from ARMv2a onward.
//!
//! Grounded on `original_source/ArmEmu/Test/Test_CoProcessor.cpp`'s ARMv2 vs.
//! ARMv2a scenario: on ARMv2 the coprocessor instruction is simply undefined
//! (no slot bound); on ARMv2a, CP15 is bound and answers the ID register read
//! in supervisor mode.

use arbitrary_int::u4;

use crate::coprocessor::{CoprocRegisterAddress, Coprocessor, CoprocResult};
use crate::psr::ProcessorMode;

/// The fixed processor-ID word CP15's register 0 reports. ARM's convention
/// packs implementor ('A' = 0x41), architecture/variant, and part number;
/// the exact value is a fixture constant rather than a derived one.
pub const ARM_ID_REGISTER: u32 = 0x4156_0300;

pub struct Cp15 {
    current_mode: ProcessorMode,
}

impl Cp15 {
    pub fn new() -> Self {
        Cp15 {
            current_mode: ProcessorMode::Svc32,
        }
    }

    /// Only MRC/MCR issued from a supervisor mode are accepted on CP15,
    /// not merely any privileged mode.
    fn supervisor(&self) -> bool {
        matches!(self.current_mode, ProcessorMode::Svc26 | ProcessorMode::Svc32)
    }
}

impl Default for Cp15 {
    fn default() -> Self {
        Self::new()
    }
}

impl Coprocessor for Cp15 {
    fn sync_mode(&mut self, mode: ProcessorMode) {
        self.current_mode = mode;
    }

    fn handle_data_op(&mut self, _address: CoprocRegisterAddress) -> CoprocResult<()> {
        CoprocResult::NotAccepted
    }

    fn handle_register_to_coproc(&mut self, _address: CoprocRegisterAddress, _value: u32) -> CoprocResult<()> {
        // CP15 register 0 (the ID register) is read-only; every other
        // register this minimal model does not implement.
        CoprocResult::NotAccepted
    }

    fn handle_coproc_to_register(&mut self, address: CoprocRegisterAddress) -> CoprocResult<u32> {
        if !self.supervisor() {
            return CoprocResult::NotAccepted;
        }
        if address.crn == u4::new(0) {
            CoprocResult::Handled(ARM_ID_REGISTER)
        } else {
            CoprocResult::NotAccepted
        }
    }

    fn handle_load(&mut self, _crd: u4, _addr: u32, _long: bool) -> CoprocResult<()> {
        CoprocResult::NotAccepted
    }

    fn handle_store(&mut self, _crd: u4, _addr: u32, _long: bool) -> CoprocResult<u32> {
        CoprocResult::NotAccepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_address() -> CoprocRegisterAddress {
        CoprocRegisterAddress {
            opcode: u4::new(0),
            crn: u4::new(0),
            crm: u4::new(0),
            op2: u4::new(0),
        }
    }

    #[test]
    fn id_register_readable_in_supervisor_mode() {
        let mut cp15 = Cp15::new();
        cp15.sync_mode(ProcessorMode::Svc32);
        assert_eq!(cp15.handle_coproc_to_register(id_address()), CoprocResult::Handled(ARM_ID_REGISTER));
    }

    #[test]
    fn id_register_refused_in_user_mode() {
        let mut cp15 = Cp15::new();
        cp15.sync_mode(ProcessorMode::User32);
        assert_eq!(cp15.handle_coproc_to_register(id_address()), CoprocResult::NotAccepted);
    }
}
