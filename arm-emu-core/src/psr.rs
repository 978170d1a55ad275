//! Processor modes and the program status word.
//!
//! In 26-bit modes the whole PSR lives in the upper/lower bits of R15 and is
//! synthesized on read, split on write; treating this as a computed accessor
//! rather than shared storage avoids aliasing bugs. In 32-bit modes CPSR is
//! independent state and each privileged mode has its own SPSR.
//!
//! The CPSR/SPSR bitfield layout follows the same register style as
//! `cortex_ar::register::{Dfsr, Ifsr}`: a `#[bitbybit::bitfield(u32)]`
//! struct with named single-bit and multi-bit accessors.

use arbitrary_int::{u2, u5};
use num_enum::TryFromPrimitive;

/// The four condition flags, independent of 26-bit/32-bit representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub negative: bool,
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,
}

/// A processor mode. In 26-bit address mode: `User26`, `Firq26`, `Irq26`,
/// `Svc26`. In 32-bit mode: `User32`, `Firq32`, `Irq32`, `Svc32`, `Abort32`,
/// `Undefined32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorMode {
    User26,
    Firq26,
    Irq26,
    Svc26,
    User32,
    Firq32,
    Irq32,
    Svc32,
    Abort32,
    Undefined32,
}

/// Which physical bank of R8-R14 a mode reads and writes (the "current
/// bank" pointer); a 26-bit mode and its 32-bit counterpart share a
/// bank, since the two addressing conventions are never active on the same
/// emulated core at once but still describe the same architectural bank).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    User,
    Firq,
    Irq,
    Svc,
    Abort,
    Undefined,
}

/// One entry of the five-entry SPSR bank (32-bit privileged modes only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpsrSlot {
    Firq,
    Irq,
    Svc,
    Abort,
    Undefined,
}

impl ProcessorMode {
    pub fn is_26bit(self) -> bool {
        matches!(
            self,
            ProcessorMode::User26 | ProcessorMode::Firq26 | ProcessorMode::Irq26 | ProcessorMode::Svc26
        )
    }

    pub fn is_privileged(self) -> bool {
        !matches!(self, ProcessorMode::User26 | ProcessorMode::User32)
    }

    pub fn bank(self) -> Bank {
        match self {
            ProcessorMode::User26 | ProcessorMode::User32 => Bank::User,
            ProcessorMode::Firq26 | ProcessorMode::Firq32 => Bank::Firq,
            ProcessorMode::Irq26 | ProcessorMode::Irq32 => Bank::Irq,
            ProcessorMode::Svc26 | ProcessorMode::Svc32 => Bank::Svc,
            ProcessorMode::Abort32 => Bank::Abort,
            ProcessorMode::Undefined32 => Bank::Undefined,
        }
    }

    /// The SPSR slot this mode reads/writes, or `None` in User mode or any
    /// 26-bit mode (which has no independent SPSR).
    pub fn spsr_slot(self) -> Option<SpsrSlot> {
        match self {
            ProcessorMode::Firq32 => Some(SpsrSlot::Firq),
            ProcessorMode::Irq32 => Some(SpsrSlot::Irq),
            ProcessorMode::Svc32 => Some(SpsrSlot::Svc),
            ProcessorMode::Abort32 => Some(SpsrSlot::Abort),
            ProcessorMode::Undefined32 => Some(SpsrSlot::Undefined),
            _ => None,
        }
    }

    /// Decodes the 2-bit mode field packed into bits 1:0 of a 26-bit R15.
    pub fn from_26bit_field(bits: u2) -> ProcessorMode {
        match bits.value() {
            0b00 => ProcessorMode::User26,
            0b01 => ProcessorMode::Firq26,
            0b10 => ProcessorMode::Irq26,
            _ => ProcessorMode::Svc26,
        }
    }

    pub fn to_26bit_field(self) -> u2 {
        let raw = match self {
            ProcessorMode::User26 => 0b00,
            ProcessorMode::Firq26 => 0b01,
            ProcessorMode::Irq26 => 0b10,
            ProcessorMode::Svc26 => 0b11,
            _ => panic!("mode {self:?} has no 26-bit field encoding"),
        };
        u2::new(raw)
    }

    /// Decodes the standard 5-bit M\[4:0\] field used by 32-bit CPSR.
    pub fn from_32bit_field(bits: u5) -> Option<ProcessorMode> {
        match bits.value() {
            0b10000 => Some(ProcessorMode::User32),
            0b10001 => Some(ProcessorMode::Firq32),
            0b10010 => Some(ProcessorMode::Irq32),
            0b10011 => Some(ProcessorMode::Svc32),
            0b10111 => Some(ProcessorMode::Abort32),
            0b11011 => Some(ProcessorMode::Undefined32),
            _ => None,
        }
    }

    pub fn to_32bit_field(self) -> u5 {
        let raw: u8 = match self {
            ProcessorMode::User32 => 0b10000,
            ProcessorMode::Firq32 => 0b10001,
            ProcessorMode::Irq32 => 0b10010,
            ProcessorMode::Svc32 => 0b10011,
            ProcessorMode::Abort32 => 0b10111,
            ProcessorMode::Undefined32 => 0b11011,
            _ => panic!("mode {self:?} has no 32-bit field encoding"),
        };
        u5::new(raw)
    }
}

/// CPSR (32-bit modes only): flags in bits 31:28, FIQ-disable in bit 6,
/// IRQ-disable in bit 7, mode field in bits 4:0.
#[bitbybit::bitfield(u32)]
pub struct Cpsr {
    #[bit(31, rw)]
    pub n: bool,
    #[bit(30, rw)]
    pub z: bool,
    #[bit(29, rw)]
    pub c: bool,
    #[bit(28, rw)]
    pub v: bool,
    #[bit(7, rw)]
    pub irq_disable: bool,
    #[bit(6, rw)]
    pub firq_disable: bool,
    #[bits(0..=4, rw)]
    pub mode_bits: u5,
}

impl Cpsr {
    pub fn flags(self) -> Flags {
        Flags {
            negative: self.n(),
            zero: self.z(),
            carry: self.c(),
            overflow: self.v(),
        }
    }

    pub fn with_flags(self, flags: Flags) -> Self {
        self.with_n(flags.negative)
            .with_z(flags.zero)
            .with_c(flags.carry)
            .with_v(flags.overflow)
    }

    pub fn mode(self) -> ProcessorMode {
        ProcessorMode::from_32bit_field(self.mode_bits())
            .expect("CPSR mode field always holds a valid 32-bit mode once initialized")
    }

    pub fn with_mode(self, mode: ProcessorMode) -> Self {
        self.with_mode_bits(mode.to_32bit_field())
    }
}

impl core::fmt::Debug for Cpsr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cpsr")
            .field("n", &self.n())
            .field("z", &self.z())
            .field("c", &self.c())
            .field("v", &self.v())
            .field("irq_disable", &self.irq_disable())
            .field("firq_disable", &self.firq_disable())
            .field("mode_bits", &self.mode_bits())
            .finish()
    }
}

impl PartialEq for Cpsr {
    fn eq(&self, other: &Self) -> bool {
        self.raw_value() == other.raw_value()
    }
}
impl Eq for Cpsr {}

/// SPSR (32-bit privileged modes only): identical bit layout to CPSR,
/// captured verbatim on exception entry and restored on exception return.
pub type Spsr = Cpsr;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpsr_round_trips_flags_and_mode() {
        let psr = Cpsr::new_with_raw_value(0)
            .with_flags(Flags {
                negative: true,
                zero: false,
                carry: true,
                overflow: false,
            })
            .with_mode(ProcessorMode::Svc32)
            .with_irq_disable(true);

        assert_eq!(
            psr.flags(),
            Flags {
                negative: true,
                zero: false,
                carry: true,
                overflow: false,
            }
        );
        assert_eq!(psr.mode(), ProcessorMode::Svc32);
        assert!(psr.irq_disable());
        assert!(!psr.firq_disable());
    }

    #[test]
    fn mode_26bit_field_round_trips() {
        for mode in [
            ProcessorMode::User26,
            ProcessorMode::Firq26,
            ProcessorMode::Irq26,
            ProcessorMode::Svc26,
        ] {
            let field = mode.to_26bit_field();
            assert_eq!(ProcessorMode::from_26bit_field(field), mode);
        }
    }

    #[test]
    fn mode_32bit_field_round_trips() {
        for mode in [
            ProcessorMode::User32,
            ProcessorMode::Firq32,
            ProcessorMode::Irq32,
            ProcessorMode::Svc32,
            ProcessorMode::Abort32,
            ProcessorMode::Undefined32,
        ] {
            let field = mode.to_32bit_field();
            assert_eq!(ProcessorMode::from_32bit_field(field), Some(mode));
        }
    }
}
