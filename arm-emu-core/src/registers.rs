//! The banked general register file (C3).
//!
//! Physical storage is one flat "live" array of R0-R15 plus one overlay per
//! bank for the registers that bank differs on (R8-R12 for FIQ only, R13-R14
//! for every privileged bank). A "current bank" tag selects which overlay is
//! live; on a mode change we save the live copy into the old bank's overlay
//! and load the new bank's overlay into the live copy: a few extra copies on
//! the rare mode-change path buys branch-free access on every ordinary
//! register read.
//!
//! Grounded on the register/core split in `other_examples`
//! `EbbDrop-redplanet`'s `Core`/`Registers` (a `Core` holding an
//! `Allocated<A, Registers>`) and `kromych-yamos6502`'s `RegisterFile`.

use crate::psr::{Bank, Cpsr, Flags, ProcessorMode, Spsr, SpsrSlot};
use crate::word::Word;

/// Index of the program counter within the logical R0-R15 view.
pub const PC: usize = 15;
/// Index of the link register.
pub const LR: usize = 14;
/// Index of the stack pointer.
pub const SP: usize = 13;

/// One bank's worth of R8-R14 overlay storage. Only FIQ uses r8_r12; every
/// other bank leaves it at zero and only r13/r14 matter.
#[derive(Debug, Clone, Copy, Default)]
struct BankedRegisters {
    r8_r12: [Word; 5],
    r13: Word,
    r14: Word,
}

/// The banked general register file plus CPSR/SPSRs.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    /// R0-R15 as currently visible: R0-R7 are never banked, R8-R15 reflect
    /// whichever bank is live.
    live: [Word; 16],
    mode: ProcessorMode,
    cpsr: Cpsr,
    banks: BankTable,
    spsrs: [Spsr; 5],
}

#[derive(Debug, Clone, Default)]
struct BankTable {
    user: BankedRegisters,
    firq: BankedRegisters,
    irq: BankedRegisters,
    svc: BankedRegisters,
    abort: BankedRegisters,
    undefined: BankedRegisters,
}

impl BankTable {
    fn get(&self, bank: Bank) -> &BankedRegisters {
        match bank {
            Bank::User => &self.user,
            Bank::Firq => &self.firq,
            Bank::Irq => &self.irq,
            Bank::Svc => &self.svc,
            Bank::Abort => &self.abort,
            Bank::Undefined => &self.undefined,
        }
    }

    fn get_mut(&mut self, bank: Bank) -> &mut BankedRegisters {
        match bank {
            Bank::User => &mut self.user,
            Bank::Firq => &mut self.firq,
            Bank::Irq => &mut self.irq,
            Bank::Svc => &mut self.svc,
            Bank::Abort => &mut self.abort,
            Bank::Undefined => &mut self.undefined,
        }
    }
}

impl RegisterFile {
    /// Resets into Supervisor mode, IRQ/FIQ masked, PC=0: the state at
    /// system startup and on every hardware reset.
    pub fn reset() -> Self {
        let cpsr = Cpsr::new_with_raw_value(0)
            .with_mode(ProcessorMode::Svc32)
            .with_irq_disable(true)
            .with_firq_disable(true);
        RegisterFile {
            live: [0; 16],
            mode: ProcessorMode::Svc32,
            cpsr,
            banks: BankTable::default(),
            spsrs: [Spsr::new_with_raw_value(0); 5],
        }
    }

    /// Resets into 26-bit Supervisor mode (used by ARMv2/ARMv3 configurations).
    pub fn reset_26bit() -> Self {
        let mut regs = Self::reset();
        regs.mode = ProcessorMode::Svc26;
        regs
    }

    pub fn mode(&self) -> ProcessorMode {
        self.mode
    }

    /// Ordinary R0-R15 read (current bank).
    pub fn get(&self, n: usize) -> Word {
        debug_assert!(n < 16);
        if n == PC {
            self.live[PC]
        } else {
            self.live[n]
        }
    }

    /// Ordinary R0-R15 write (current bank). Writing R15 flushes the
    /// pipeline at the caller's discretion (the register file only stores
    /// the value; [`crate::exec`] is responsible for noticing the flush).
    pub fn set(&mut self, n: usize, value: Word) {
        debug_assert!(n < 16);
        self.live[n] = value;
    }

    /// Forces access through the User bank regardless of current mode, used
    /// by the privileged LDM/STM "^" variant.
    pub fn get_user(&self, n: usize) -> Word {
        if n < 8 || n == PC {
            return self.live[n];
        }
        if self.mode.bank() == Bank::User {
            return self.live[n];
        }
        let user = &self.banks.user;
        if n <= 12 {
            user.r8_r12[n - 8]
        } else if n == SP {
            user.r13
        } else {
            user.r14
        }
    }

    pub fn set_user(&mut self, n: usize, value: Word) {
        if n < 8 || n == PC {
            self.live[n] = value;
            return;
        }
        if self.mode.bank() == Bank::User {
            self.live[n] = value;
            return;
        }
        let user = &mut self.banks.user;
        if n <= 12 {
            user.r8_r12[n - 8] = value;
        } else if n == SP {
            user.r13 = value;
        } else {
            user.r14 = value;
        }
    }

    pub fn get_pc(&self) -> Word {
        self.live[PC]
    }

    /// Writes R15. Always flushes the pipeline; the next fetch uses this
    /// value.
    pub fn set_pc(&mut self, value: Word) {
        self.live[PC] = value;
    }

    /// The whole program status word, synthesized for 26-bit modes from the
    /// top/bottom bits of PC.
    pub fn get_psr(&self) -> Cpsr {
        if self.mode.is_26bit() {
            synthesize_psr_26(self.live[PC], self.mode)
        } else {
            self.cpsr
        }
    }

    /// Sets the whole status word. May imply a mode change, which re-resolves
    /// the bank pointer and (via [`crate::exception::IrqMaskBus`], owned by
    /// the caller) should re-publish the IRQ mask.
    pub fn set_psr(&mut self, psr: Cpsr) {
        let new_mode = psr.mode();
        if self.mode.is_26bit() {
            let (pc, _) = split_psr_26(self.live[PC]);
            self.live[PC] = pack_psr_26(pc, psr.flags(), psr.irq_disable(), psr.firq_disable(), new_mode);
        } else {
            self.cpsr = psr;
        }
        self.switch_mode(new_mode);
    }

    /// Selectively updates flags / interrupt bits / mode bits. In User mode
    /// only the condition flags are writable.
    pub fn update_psr(&mut self, value: Cpsr, update_control: bool) {
        let mut psr = self.get_psr();
        psr = psr.with_flags(value.flags());
        if update_control && self.mode.is_privileged() {
            psr = psr
                .with_irq_disable(value.irq_disable())
                .with_firq_disable(value.firq_disable())
                .with_mode(value.mode());
        }
        self.set_psr(psr);
    }

    pub fn flags(&self) -> Flags {
        self.get_psr().flags()
    }

    pub fn set_flags(&mut self, flags: Flags) {
        let psr = self.get_psr().with_flags(flags);
        self.set_psr(psr);
    }

    /// Reads the SPSR for the current privileged mode. Panics if called from
    /// User mode or a 26-bit mode, which have no SPSR: callers must check
    /// `mode().spsr_slot()` first, matching the architectural precondition.
    pub fn get_spsr(&self) -> Spsr {
        let slot = self
            .mode
            .spsr_slot()
            .expect("SPSR only exists in a 32-bit privileged mode");
        self.spsrs[slot as usize]
    }

    pub fn set_spsr(&mut self, value: Spsr) {
        let slot = self
            .mode
            .spsr_slot()
            .expect("SPSR only exists in a 32-bit privileged mode");
        self.spsrs[slot as usize] = value;
    }

    /// Writes the SPSR for an arbitrary (already resolved) slot, used by the
    /// exception engine when capturing CPSR into the *new* mode's SPSR
    /// before the bank pointer moves.
    pub fn set_spsr_slot(&mut self, slot: SpsrSlot, value: Spsr) {
        self.spsrs[slot as usize] = value;
    }

    /// Re-resolves the bank pointer for a mode change: saves the live R8-R14
    /// into the old bank, loads the new bank into the live array.
    pub fn switch_mode(&mut self, new_mode: ProcessorMode) {
        if new_mode == self.mode {
            return;
        }
        let old_bank = self.mode.bank();
        let new_bank = new_mode.bank();

        if old_bank != new_bank {
            {
                let saved = self.banks.get_mut(old_bank);
                if old_bank == Bank::Firq {
                    saved.r8_r12.copy_from_slice(&self.live[8..13]);
                }
                saved.r13 = self.live[SP];
                saved.r14 = self.live[LR];
            }
            {
                let loaded = *self.banks.get(new_bank);
                if new_bank == Bank::Firq {
                    self.live[8..13].copy_from_slice(&loaded.r8_r12);
                } else if old_bank == Bank::Firq {
                    // Leaving FIQ: R8-R12 revert to the (never-banked-for-
                    // anyone-else) User copies.
                    self.live[8..13].copy_from_slice(&self.banks.user.r8_r12);
                }
                self.live[SP] = loaded.r13;
                self.live[LR] = loaded.r14;
            }
        }
        self.mode = new_mode;
        if !new_mode.is_26bit() {
            self.cpsr = self.cpsr.with_mode(new_mode);
        }
    }
}

/// Splits a 26-bit-mode R15 into (pc, packed-status-bits).
fn split_psr_26(r15: Word) -> (Word, Word) {
    (r15 & 0x03FF_FFFC, r15 & !0x03FF_FFFC)
}

/// Synthesizes a full `Cpsr` view from a 26-bit-mode R15.
pub fn synthesize_psr_26(r15: Word, mode: ProcessorMode) -> Cpsr {
    let flags = Flags {
        negative: (r15 & (1 << 31)) != 0,
        zero: (r15 & (1 << 30)) != 0,
        carry: (r15 & (1 << 29)) != 0,
        overflow: (r15 & (1 << 28)) != 0,
    };
    let irq_disable = (r15 & (1 << 27)) != 0;
    let firq_disable = (r15 & (1 << 26)) != 0;
    Cpsr::new_with_raw_value(0)
        .with_flags(flags)
        .with_irq_disable(irq_disable)
        .with_firq_disable(firq_disable)
        .with_mode(mode)
}

/// Packs a PC value plus status bits back into a 26-bit-mode R15.
pub fn pack_psr_26(pc: Word, flags: Flags, irq_disable: bool, firq_disable: bool, mode: ProcessorMode) -> Word {
    let mut word = pc & 0x03FF_FFFC;
    word |= (flags.negative as Word) << 31;
    word |= (flags.zero as Word) << 30;
    word |= (flags.carry as Word) << 29;
    word |= (flags.overflow as Word) << 28;
    word |= (irq_disable as Word) << 27;
    word |= (firq_disable as Word) << 26;
    word |= mode.to_26bit_field().value() as Word;
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_enters_supervisor_masked() {
        let regs = RegisterFile::reset();
        assert_eq!(regs.mode(), ProcessorMode::Svc32);
        assert_eq!(regs.get_pc(), 0);
        assert!(regs.get_psr().irq_disable());
        assert!(regs.get_psr().firq_disable());
    }

    #[test]
    fn firq_bank_is_isolated_from_other_modes() {
        let mut regs = RegisterFile::reset();
        regs.set(8, 0xAAAA_AAAA);
        regs.switch_mode(ProcessorMode::Firq32);
        regs.set(8, 0xBBBB_BBBB);
        regs.switch_mode(ProcessorMode::Svc32);
        assert_eq!(regs.get(8), 0xAAAA_AAAA);
        regs.switch_mode(ProcessorMode::Firq32);
        assert_eq!(regs.get(8), 0xBBBB_BBBB);
    }

    #[test]
    fn svc_and_abort_have_distinct_r13_r14() {
        let mut regs = RegisterFile::reset();
        regs.set(SP, 0x1000);
        regs.set(LR, 0x2000);
        regs.switch_mode(ProcessorMode::Abort32);
        regs.set(SP, 0x3000);
        regs.set(LR, 0x4000);
        regs.switch_mode(ProcessorMode::Svc32);
        assert_eq!(regs.get(SP), 0x1000);
        assert_eq!(regs.get(LR), 0x2000);
    }

    #[test]
    fn user_view_bypasses_current_bank() {
        let mut regs = RegisterFile::reset();
        regs.switch_mode(ProcessorMode::User32);
        regs.set(SP, 0x8000);
        regs.switch_mode(ProcessorMode::Svc32);
        assert_eq!(regs.get_user(SP), 0x8000);
    }

    #[test]
    fn psr_26bit_round_trips_through_pc() {
        let mut regs = RegisterFile::reset_26bit();
        regs.set_pc(0x0000_1000);
        let psr = Cpsr::new_with_raw_value(0)
            .with_flags(Flags {
                negative: true,
                zero: false,
                carry: true,
                overflow: false,
            })
            .with_irq_disable(true)
            .with_mode(ProcessorMode::Irq26);
        regs.set_psr(psr);
        assert_eq!(regs.mode(), ProcessorMode::Irq26);
        assert_eq!(regs.get_pc() & 0x03FF_FFFC, 0x0000_1000);
        assert!(regs.get_psr().n());
        assert!(regs.get_psr().irq_disable());
    }
}
