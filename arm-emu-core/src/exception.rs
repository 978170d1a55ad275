//! The exception engine (C4): vector table, mode switch, and LR capture.
//!
//! Grounded on the vector table in `cortex-r-rt/src/lib.rs`
//! (`_vector_table`: reset, undefined, svc, prefetch abort, data abort,
//! unused, irq, fiq — each an `ldr pc, =handler`) and its context-save
//! convention around exception entry. There is no real CPU stack to spill
//! registers onto here, so entry/exit is direct struct mutation on
//! [`crate::registers::RegisterFile`] rather than that crate's
//! `save_context!`/`restore_context!` assembly macros.

use crate::psr::{ProcessorMode, SpsrSlot};
use crate::registers::RegisterFile;
use crate::word::Word;

/// The eight exception kinds, in vector-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Reset,
    UndefinedInstruction,
    SoftwareInterrupt,
    PrefetchAbort,
    DataAbort,
    AddressException,
    Irq,
    Firq,
}

impl ExceptionKind {
    /// The fixed vector address for this exception.
    pub fn vector(self) -> Word {
        match self {
            ExceptionKind::Reset => 0x00,
            ExceptionKind::UndefinedInstruction => 0x04,
            ExceptionKind::SoftwareInterrupt => 0x08,
            ExceptionKind::PrefetchAbort => 0x0C,
            ExceptionKind::DataAbort => 0x10,
            ExceptionKind::AddressException => 0x14,
            ExceptionKind::Irq => 0x18,
            ExceptionKind::Firq => 0x1C,
        }
    }

    /// The mode the core enters, given whether it was running in a 26-bit
    /// mode at the moment the exception was taken.
    pub fn new_mode(self, was_26bit: bool) -> ProcessorMode {
        use ExceptionKind::*;
        match (self, was_26bit) {
            (Reset, true) => ProcessorMode::Svc26,
            (Reset, false) => ProcessorMode::Svc32,
            (UndefinedInstruction, true) => ProcessorMode::Svc26,
            (UndefinedInstruction, false) => ProcessorMode::Undefined32,
            (SoftwareInterrupt, true) => ProcessorMode::Svc26,
            (SoftwareInterrupt, false) => ProcessorMode::Svc32,
            (PrefetchAbort, true) => ProcessorMode::Svc26,
            (PrefetchAbort, false) => ProcessorMode::Abort32,
            (DataAbort, true) => ProcessorMode::Svc26,
            (DataAbort, false) => ProcessorMode::Abort32,
            (AddressException, true) => ProcessorMode::Svc26,
            (AddressException, false) => ProcessorMode::Svc32,
            (Irq, true) => ProcessorMode::Irq26,
            (Irq, false) => ProcessorMode::Irq32,
            (Firq, true) => ProcessorMode::Firq26,
            (Firq, false) => ProcessorMode::Firq32,
        }
    }

    /// Whether this exception forces FIQ masked on entry. Every exception
    /// forces IRQ masked; only Reset and FIQ also force FIQ masked.
    pub fn masks_firq(self) -> bool {
        matches!(self, ExceptionKind::Reset | ExceptionKind::Firq)
    }

    /// Offset from the address of the instruction that caused the exception
    /// (not the pipeline-read PC+8 value) to the return address captured
    /// into LR. Reset has no meaningful return address.
    pub fn return_offset(self) -> i64 {
        match self {
            ExceptionKind::Reset => 0,
            ExceptionKind::UndefinedInstruction => 4,
            ExceptionKind::SoftwareInterrupt => 4,
            ExceptionKind::PrefetchAbort => 4,
            ExceptionKind::DataAbort => 8,
            ExceptionKind::AddressException => 8,
            ExceptionKind::Irq => 4,
            ExceptionKind::Firq => 4,
        }
    }
}

/// Interrupt-mask publication, implemented by whatever owns the devices
/// wired onto the interrupt bus.
pub trait IrqMaskBus {
    fn publish_mask(&mut self, irq_masked: bool, firq_masked: bool);
}

/// A bus with nothing listening; used by tests and by configurations with no
/// interrupt-driven devices.
pub struct NullIrqMaskBus;
impl IrqMaskBus for NullIrqMaskBus {
    fn publish_mask(&mut self, _irq_masked: bool, _firq_masked: bool) {}
}

/// Drives a register file through the five architectural steps of taking an
/// exception.
pub fn raise(
    regs: &mut RegisterFile,
    kind: ExceptionKind,
    faulting_instruction_address: Word,
    bus: &mut dyn IrqMaskBus,
) {
    let was_26bit = regs.mode().is_26bit();
    let new_mode = kind.new_mode(was_26bit);

    let return_address = (faulting_instruction_address as i64 + kind.return_offset()) as Word;

    if !was_26bit {
        if let Some(slot) = new_mode.spsr_slot() {
            let current_psr = regs.get_psr();
            save_spsr(regs, slot, current_psr);
        }
    }

    regs.switch_mode(new_mode);
    regs.set(crate::registers::LR, return_address);

    let mut psr = regs.get_psr();
    psr = psr.with_irq_disable(true);
    if kind.masks_firq() {
        psr = psr.with_firq_disable(true);
    }
    regs.set_psr(psr);

    bus.publish_mask(true, psr.firq_disable());

    regs.set_pc(kind.vector());
}

fn save_spsr(regs: &mut RegisterFile, slot: SpsrSlot, value: crate::psr::Spsr) {
    regs.set_spsr_slot(slot, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::RegisterFile;

    #[test]
    fn irq_enters_irq_mode_and_masks_irq_only() {
        let mut regs = RegisterFile::reset();
        regs.set_psr(regs.get_psr().with_irq_disable(false).with_firq_disable(false));
        let mut bus = NullIrqMaskBus;
        raise(&mut regs, ExceptionKind::Irq, 0x1000, &mut bus);
        assert_eq!(regs.mode(), ProcessorMode::Irq32);
        assert!(regs.get_psr().irq_disable());
        assert!(!regs.get_psr().firq_disable());
        assert_eq!(regs.get_pc(), 0x18);
        assert_eq!(regs.get(crate::registers::LR), 0x1004);
    }

    #[test]
    fn data_abort_captures_plus_eight() {
        let mut regs = RegisterFile::reset();
        let mut bus = NullIrqMaskBus;
        raise(&mut regs, ExceptionKind::DataAbort, 0x2000, &mut bus);
        assert_eq!(regs.mode(), ProcessorMode::Abort32);
        assert_eq!(regs.get(crate::registers::LR), 0x2008);
        assert_eq!(regs.get_pc(), 0x10);
    }

    #[test]
    fn reset_masks_both_firq_and_irq() {
        let mut regs = RegisterFile::reset();
        regs.set_psr(regs.get_psr().with_irq_disable(false).with_firq_disable(false));
        let mut bus = NullIrqMaskBus;
        raise(&mut regs, ExceptionKind::Reset, 0, &mut bus);
        assert!(regs.get_psr().irq_disable());
        assert!(regs.get_psr().firq_disable());
    }

    #[test]
    fn exception_entry_preserves_old_cpsr_into_new_spsr() {
        let mut regs = RegisterFile::reset();
        regs.set_psr(
            regs.get_psr()
                .with_flags(crate::psr::Flags {
                    negative: true,
                    zero: false,
                    carry: true,
                    overflow: false,
                })
                .with_irq_disable(false),
        );
        let saved_flags = regs.get_psr().flags();
        let mut bus = NullIrqMaskBus;
        raise(&mut regs, ExceptionKind::SoftwareInterrupt, 0x4000, &mut bus);
        assert_eq!(regs.get_spsr().flags(), saved_flags);
    }
}
