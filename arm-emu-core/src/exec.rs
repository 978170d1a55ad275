//! The execution loop (C10): fetch/decode/dispatch, cycle accounting, halt
//! conditions.
//!
//! Grounded on `7b7f5d54_kromych-yamos6502`'s `step`/`run` split
//! (`fn step(&mut self) -> Result<RunExit, RunError>`, a `run` that loops
//! calling `step` until something terminates it) and its fetch/decode/
//! execute loop structure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use arbitrary_int::u4;
use log::{debug, trace};

use crate::alu::{self, AluResult};
use crate::condition::Condition;
use crate::control_flow::{self, ExchangeOutcome};
use crate::coprocessor::{CoprocRegisterAddress, CoprocResult, CoprocessorBus};
use crate::decode::{self, AluOp, IndexMode, Offset, Operand2, Operation, ShiftAmount, ShiftKind};
use crate::exception::{self, ExceptionKind, IrqMaskBus};
use crate::mem::map::AddressMap;
use crate::mem::region::SystemContext;
use crate::psr::Flags;
use crate::registers::{RegisterFile, LR, PC};
use crate::transfer;
use crate::word::Word;

/// Flags the host sets/reads between instructions: a small set of atomic
/// flags on the interrupt bus. `AtomicBool` is used even though the
/// core itself is single-threaded, because the flags are the one thing a
/// separate host/UI thread is allowed to touch concurrently.
#[derive(Default)]
pub struct InterruptBus {
    host_irq: AtomicBool,
    host_firq: AtomicBool,
    halt: AtomicBool,
    irq_masked: AtomicBool,
    firq_masked: AtomicBool,
}

impl InterruptBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_irq(&self) {
        self.host_irq.store(true, Ordering::SeqCst);
    }

    pub fn request_firq(&self) {
        self.host_firq.store(true, Ordering::SeqCst);
    }

    pub fn request_halt(&self) {
        self.halt.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halt.load(Ordering::SeqCst)
    }

    fn pending_irq(&self) -> bool {
        self.host_irq.load(Ordering::SeqCst)
    }

    fn pending_firq(&self) -> bool {
        self.host_firq.load(Ordering::SeqCst)
    }

    fn clear_irq(&self) {
        self.host_irq.store(false, Ordering::SeqCst);
    }

    fn clear_firq(&self) {
        self.host_firq.store(false, Ordering::SeqCst);
    }
}

impl IrqMaskBus for InterruptBus {
    fn publish_mask(&mut self, irq_masked: bool, firq_masked: bool) {
        self.irq_masked.store(irq_masked, Ordering::SeqCst);
        self.firq_masked.store(firq_masked, Ordering::SeqCst);
    }
}

impl SystemContext for InterruptBus {
    fn raise_irq(&mut self, _line: u32) {
        self.request_irq();
    }

    fn raise_firq(&mut self, _line: u32) {
        self.request_firq();
    }
}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    CycleBudgetExhausted,
    Breakpoint(u16),
    Halted,
}

/// Cumulative execution metrics: cycle count, elapsed monotonic time,
/// tallies of instruction-class dispatches.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub cycles: u64,
    pub elapsed: Duration,
    pub data_processing: u64,
    pub multiply: u64,
    pub single_transfer: u64,
    pub block_transfer: u64,
    pub branch: u64,
    pub software_interrupt: u64,
    pub coprocessor: u64,
    pub swap: u64,
    pub undefined: u64,
}

/// Fixed cycle cost charged to a failed-condition instruction.
const FAILED_CONDITION_CYCLES: u32 = 1;

struct ExecOutcome {
    cycles: u32,
    flushed: bool,
    terminate: Option<TerminationReason>,
}

impl ExecOutcome {
    fn simple(cycles: u32) -> Self {
        ExecOutcome {
            cycles,
            flushed: false,
            terminate: None,
        }
    }

    fn flushed(cycles: u32) -> Self {
        ExecOutcome {
            cycles,
            flushed: true,
            terminate: None,
        }
    }
}

/// The complete emulated system: register file, address space, coprocessor
/// bus, interrupt bus.
pub struct Core {
    pub registers: RegisterFile,
    pub read_map: AddressMap,
    pub write_map: AddressMap,
    pub coprocessors: CoprocessorBus,
    pub interrupts: InterruptBus,
    metrics: Metrics,
}

impl Core {
    pub fn new(read_map: AddressMap, write_map: AddressMap, coprocessors: CoprocessorBus, mode_26bit: bool) -> Self {
        Core {
            registers: if mode_26bit {
                RegisterFile::reset_26bit()
            } else {
                RegisterFile::reset()
            },
            read_map,
            write_map,
            coprocessors,
            interrupts: InterruptBus::new(),
            metrics: Metrics::default(),
        }
    }

    /// Runs until the cycle budget is exhausted, a breakpoint fires, or the
    /// halt flag is observed.
    pub fn run(&mut self, cycle_budget: u64) -> (Metrics, TerminationReason) {
        let start = Instant::now();
        let mut consumed: u64 = 0;

        let reason = loop {
            if self.interrupts.is_halted() {
                break TerminationReason::Halted;
            }
            if consumed >= cycle_budget {
                break TerminationReason::CycleBudgetExhausted;
            }

            let masked = self.registers.get_psr();
            if self.interrupts.pending_firq() && !masked.firq_disable() {
                self.interrupts.clear_firq();
                let pc = self.registers.get_pc();
                exception::raise(&mut self.registers, ExceptionKind::Firq, pc.wrapping_sub(8), &mut self.interrupts);
                consumed += 2;
                self.metrics.cycles += 2;
                continue;
            }
            if self.interrupts.pending_irq() && !masked.irq_disable() {
                self.interrupts.clear_irq();
                let pc = self.registers.get_pc();
                exception::raise(&mut self.registers, ExceptionKind::Irq, pc.wrapping_sub(8), &mut self.interrupts);
                consumed += 2;
                self.metrics.cycles += 2;
                continue;
            }

            let fetch_addr = self.registers.get_pc();
            let fetch = self.read_map.read_typed(fetch_addr);
            if fetch.aborted {
                exception::raise(&mut self.registers, ExceptionKind::PrefetchAbort, fetch_addr, &mut self.interrupts);
                consumed += 1;
                continue;
            }

            let decoded = decode::decode(fetch.value);
            trace!("pc={fetch_addr:#010x} word={:#010x} op={:?}", fetch.value, decoded.operation);

            if !decoded.condition.evaluate(self.registers.flags()) {
                if decoded.condition == Condition::Never {
                    exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, fetch_addr, &mut self.interrupts);
                } else {
                    self.registers.set_pc(fetch_addr.wrapping_add(4));
                }
                consumed += FAILED_CONDITION_CYCLES as u64;
                self.metrics.cycles += FAILED_CONDITION_CYCLES as u64;
                continue;
            }

            let outcome = self.dispatch(fetch_addr, decoded.operation);
            consumed += outcome.cycles as u64;
            self.metrics.cycles += outcome.cycles as u64;

            if let Some(reason) = outcome.terminate {
                break reason;
            }
            if !outcome.flushed {
                self.registers.set_pc(fetch_addr.wrapping_add(4));
            }
        };

        self.metrics.elapsed += start.elapsed();
        debug!("run() returned after {} cycles: {reason:?}", self.metrics.cycles);
        (self.metrics.clone(), reason)
    }

    fn dispatch(&mut self, instr_addr: Word, op: Operation) -> ExecOutcome {
        let pc_plus_8 = instr_addr.wrapping_add(8);
        let enforce_26bit = self.registers.mode().is_26bit();

        match op {
            Operation::DataProcessing { op, set_flags, rn, rd, operand2 } => {
                self.metrics.data_processing += 1;
                self.exec_data_processing(op, set_flags, rn, rd, operand2, pc_plus_8)
            }
            Operation::PsrTransfer { to_psr, use_spsr, operand2, field_mask, rd } => {
                self.metrics.data_processing += 1;
                self.exec_psr_transfer(to_psr, use_spsr, operand2, field_mask, rd)
            }
            Operation::MultiplyShort { accumulate, set_flags, rd, rn, rs, rm } => {
                self.metrics.multiply += 1;
                let a = self.registers.get(rm.value() as usize);
                let b = self.registers.get(rs.value() as usize);
                let mut result = a.wrapping_mul(b);
                if accumulate {
                    result = result.wrapping_add(self.registers.get(rn.value() as usize));
                }
                self.registers.set(rd.value() as usize, result);
                if set_flags {
                    let carry = self.registers.flags().carry;
                    self.registers.set_flags(Flags {
                        negative: (result as i32) < 0,
                        zero: result == 0,
                        carry,
                        overflow: self.registers.flags().overflow,
                    });
                }
                ExecOutcome::simple(if accumulate { 2 } else { 1 })
            }
            Operation::MultiplyLong { signed, accumulate, set_flags, rd_hi, rd_lo, rs, rm } => {
                self.metrics.multiply += 1;
                let a = self.registers.get(rm.value() as usize);
                let b = self.registers.get(rs.value() as usize);
                let mut wide: u64 = if signed {
                    ((a as i32 as i64) * (b as i32 as i64)) as u64
                } else {
                    (a as u64) * (b as u64)
                };
                if accumulate {
                    let hi = self.registers.get(rd_hi.value() as usize) as u64;
                    let lo = self.registers.get(rd_lo.value() as usize) as u64;
                    wide = wide.wrapping_add((hi << 32) | lo);
                }
                self.registers.set(rd_lo.value() as usize, wide as u32);
                self.registers.set(rd_hi.value() as usize, (wide >> 32) as u32);
                if set_flags {
                    self.registers.set_flags(Flags {
                        negative: (wide as i64) < 0,
                        zero: wide == 0,
                        carry: self.registers.flags().carry,
                        overflow: self.registers.flags().overflow,
                    });
                }
                ExecOutcome::simple(if accumulate { 3 } else { 2 })
            }
            Operation::SingleTransfer { load, size, index, add, user_mode_access: _, rn, rd, offset } => {
                self.metrics.single_transfer += 1;
                self.exec_single_transfer(instr_addr, load, size, index, add, rn, rd, offset, pc_plus_8, enforce_26bit)
            }
            Operation::BlockTransfer { load, pre_index, up, writeback, load_psr_or_force_user, rn, register_list } => {
                self.metrics.block_transfer += 1;
                self.exec_block_transfer(instr_addr, load, pre_index, up, writeback, load_psr_or_force_user, rn, register_list)
            }
            Operation::Swap { byte, rn, rd, rm } => {
                self.metrics.swap += 1;
                let addr = self.registers.get(rn.value() as usize);
                let value = self.registers.get(rm.value() as usize);
                let result = transfer::swap(&mut self.read_map, addr, value, byte);
                if result.aborted {
                    exception::raise(&mut self.registers, ExceptionKind::DataAbort, instr_addr, &mut self.interrupts);
                    return ExecOutcome::flushed(1);
                }
                self.registers.set(rd.value() as usize, result.value);
                ExecOutcome::simple(2)
            }
            Operation::Branch { link, offset } => {
                self.metrics.branch += 1;
                let target = control_flow::branch(&mut self.registers, pc_plus_8, offset, link, instr_addr.wrapping_add(4));
                self.registers.set_pc(target);
                ExecOutcome::flushed(3)
            }
            Operation::BranchExchange { rm } => {
                self.metrics.branch += 1;
                let target = self.registers.get(rm.value() as usize);
                match control_flow::branch_exchange(target) {
                    ExchangeOutcome::Arm(addr) => {
                        self.registers.set_pc(addr);
                        ExecOutcome::flushed(3)
                    }
                    ExchangeOutcome::UndefinedThumbRequest => {
                        exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, instr_addr, &mut self.interrupts);
                        ExecOutcome::flushed(1)
                    }
                }
            }
            Operation::SoftwareInterrupt { comment: _ } => {
                self.metrics.software_interrupt += 1;
                exception::raise(&mut self.registers, ExceptionKind::SoftwareInterrupt, instr_addr, &mut self.interrupts);
                ExecOutcome::flushed(2)
            }
            Operation::Breakpoint { comment } => {
                exception::raise(&mut self.registers, ExceptionKind::PrefetchAbort, instr_addr, &mut self.interrupts);
                ExecOutcome {
                    cycles: 1,
                    flushed: true,
                    terminate: Some(TerminationReason::Breakpoint(comment)),
                }
            }
            Operation::CoprocessorDataOperation { coproc, opcode, crn: _, crd, crm, op2 } => {
                self.metrics.coprocessor += 1;
                // `CoprocRegisterAddress` has no separate crd slot; by
                // convention (matching fpa.rs) its `crn` field carries CDP's
                // destination register and `crm` the source.
                let address = CoprocRegisterAddress { opcode, crn: crd, crm, op2 };
                self.exec_coproc_data_op(coproc, address)
            }
            Operation::CoprocessorRegisterTransfer { load, coproc, opcode, crn, rd, crm, op2 } => {
                self.metrics.coprocessor += 1;
                let address = CoprocRegisterAddress { opcode, crn, crm, op2 };
                self.exec_coproc_register_transfer(instr_addr, load, coproc, address, rd)
            }
            Operation::CoprocessorDataTransfer { load, long, index, add, coproc, crd, rn, offset } => {
                self.metrics.coprocessor += 1;
                self.exec_coproc_data_transfer(instr_addr, load, long, index, add, coproc, crd, rn, offset)
            }
            Operation::Undefined => {
                self.metrics.undefined += 1;
                exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, instr_addr, &mut self.interrupts);
                ExecOutcome::flushed(1)
            }
        }
    }

    fn resolve_operand2(&self, operand2: Operand2, carry_in: bool) -> (Word, bool) {
        match operand2 {
            Operand2::Immediate { value, rotate } => {
                if rotate == 0 {
                    (value as Word, carry_in)
                } else {
                    let r = alu::shift(value as Word, ShiftKind::Ror, rotate as u32, carry_in);
                    (r.result, r.carry_out)
                }
            }
            Operand2::Register { reg, shift_kind, shift_amount } => {
                let value = self.registers.get(reg.value() as usize);
                match shift_amount {
                    ShiftAmount::Immediate(amount) => {
                        let r = alu::shift(value, shift_kind, amount as u32, carry_in);
                        (r.result, r.carry_out)
                    }
                    ShiftAmount::Register(r) => {
                        let amount = self.registers.get(r.value() as usize) & 0xFF;
                        if amount == 0 {
                            // A register-specified shift of 0 passes Rm and the
                            // carry flag through unchanged for all four shift
                            // kinds; only the immediate encoding of 0 means
                            // LSR#32/ASR#32/RRX.
                            (value, carry_in)
                        } else {
                            let r = alu::shift(value, shift_kind, amount, carry_in);
                            (r.result, r.carry_out)
                        }
                    }
                }
            }
        }
    }

    fn exec_data_processing(
        &mut self,
        op: AluOp,
        set_flags: bool,
        rn: u4,
        rd: u4,
        operand2: Operand2,
        pc_plus_8: Word,
    ) -> ExecOutcome {
        let carry_in = self.registers.flags().carry;
        let (op2_value, shifter_carry) = self.resolve_operand2(operand2, carry_in);
        let rn_value = if rn.value() as usize == PC {
            pc_plus_8
        } else {
            self.registers.get(rn.value() as usize)
        };

        let (result, flags): (Word, Flags) = match op {
            AluOp::And | AluOp::Tst => (rn_value & op2_value, alu::flags_from_logical(rn_value & op2_value, shifter_carry, self.registers.flags().overflow)),
            AluOp::Eor | AluOp::Teq => (rn_value ^ op2_value, alu::flags_from_logical(rn_value ^ op2_value, shifter_carry, self.registers.flags().overflow)),
            AluOp::Orr => (rn_value | op2_value, alu::flags_from_logical(rn_value | op2_value, shifter_carry, self.registers.flags().overflow)),
            AluOp::Mov => (op2_value, alu::flags_from_logical(op2_value, shifter_carry, self.registers.flags().overflow)),
            AluOp::Bic => (rn_value & !op2_value, alu::flags_from_logical(rn_value & !op2_value, shifter_carry, self.registers.flags().overflow)),
            AluOp::Mvn => (!op2_value, alu::flags_from_logical(!op2_value, shifter_carry, self.registers.flags().overflow)),
            AluOp::Sub | AluOp::Cmp => {
                let r: AluResult = alu::sub(rn_value, op2_value);
                (r.result, alu::flags_from_arithmetic(r))
            }
            AluOp::Rsb => {
                let r = alu::sub(op2_value, rn_value);
                (r.result, alu::flags_from_arithmetic(r))
            }
            AluOp::Add | AluOp::Cmn => {
                let r = alu::add(rn_value, op2_value);
                (r.result, alu::flags_from_arithmetic(r))
            }
            AluOp::Adc => {
                let r = alu::add_with_carry(rn_value, op2_value, carry_in);
                (r.result, alu::flags_from_arithmetic(r))
            }
            AluOp::Sbc => {
                let r = alu::sub_with_carry(rn_value, op2_value, carry_in);
                (r.result, alu::flags_from_arithmetic(r))
            }
            AluOp::Rsc => {
                let r = alu::sub_with_carry(op2_value, rn_value, carry_in);
                (r.result, alu::flags_from_arithmetic(r))
            }
        };

        let rd_is_pc = rd.value() as usize == PC;
        if !op.is_comparison() {
            self.registers.set(rd.value() as usize, result);
        }

        if set_flags {
            if rd_is_pc && !op.is_comparison() {
                // Rd=R15, S=1: restore CPSR (32-bit) or let the 26-bit PSR
                // synthesis handle it implicitly.
                if !self.registers.mode().is_26bit() {
                    let spsr = self.registers.get_spsr();
                    self.registers.set_psr(spsr);
                }
            } else {
                self.registers.set_flags(flags);
            }
        }

        if rd_is_pc && !op.is_comparison() {
            ExecOutcome::flushed(2)
        } else {
            ExecOutcome::simple(1)
        }
    }

    /// `field_mask` packs the four MSR field-select bits (`f`/`s`/`x`/`c`,
    /// bits 3:0 of instruction bits 19:16); this minimal core only
    /// distinguishes the flags field (bit 3) from the control field (bit 0);
    /// the status/extension bits are treated as reserved.
    fn exec_psr_transfer(&mut self, to_psr: bool, use_spsr: bool, operand2: Operand2, field_mask: u4, rd: u4) -> ExecOutcome {
        if to_psr {
            let (value, _) = self.resolve_operand2(operand2, self.registers.flags().carry);
            let written = crate::psr::Cpsr::new_with_raw_value(value);
            let update_flags = field_mask.value() & 0b1000 != 0;
            let update_control = field_mask.value() & 0b0001 != 0 && self.registers.mode().is_privileged();

            if use_spsr {
                if self.registers.mode().spsr_slot().is_some() {
                    let mut spsr = self.registers.get_spsr();
                    if update_flags {
                        spsr = spsr.with_flags(written.flags());
                    }
                    if update_control {
                        spsr = spsr.with_irq_disable(written.irq_disable()).with_firq_disable(written.firq_disable()).with_mode(written.mode());
                    }
                    self.registers.set_spsr(spsr);
                }
            } else {
                let mut psr = self.registers.get_psr();
                if update_flags {
                    psr = psr.with_flags(written.flags());
                }
                if update_control {
                    psr = psr.with_irq_disable(written.irq_disable()).with_firq_disable(written.firq_disable()).with_mode(written.mode());
                }
                self.registers.set_psr(psr);
            }
        } else {
            let value = if use_spsr {
                self.registers.get_spsr().raw_value()
            } else {
                self.registers.get_psr().raw_value()
            };
            self.registers.set(rd.value() as usize, value);
        }
        ExecOutcome::simple(1)
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_single_transfer(
        &mut self,
        instr_addr: Word,
        load: bool,
        size: decode::TransferSize,
        index: IndexMode,
        add: bool,
        rn: u4,
        rd: u4,
        offset: Offset,
        pc_plus_8: Word,
        enforce_26bit: bool,
    ) -> ExecOutcome {
        let base = if rn.value() as usize == PC {
            pc_plus_8
        } else {
            self.registers.get(rn.value() as usize)
        };
        let carry_in = self.registers.flags().carry;
        let offset_value = match offset {
            Offset::Immediate(imm) => imm.value() as Word,
            Offset::Register { reg, shift_kind, shift_amount } => {
                let value = self.registers.get(reg.value() as usize);
                alu::shift(value, shift_kind, shift_amount as u32, carry_in).result
            }
        };
        let offset_addr = if add { base.wrapping_add(offset_value) } else { base.wrapping_sub(offset_value) };

        let (transfer_addr, writeback_addr) = match index {
            IndexMode::PreIndexed { writeback } => (offset_addr, if writeback { Some(offset_addr) } else { None }),
            IndexMode::PostIndexed => (base, Some(offset_addr)),
        };

        if load {
            let result = transfer::load_sized(&mut self.read_map, transfer_addr, size, enforce_26bit);
            if result.address_exception {
                exception::raise(&mut self.registers, ExceptionKind::AddressException, instr_addr, &mut self.interrupts);
                return ExecOutcome::flushed(2);
            }
            if result.aborted {
                exception::raise(&mut self.registers, ExceptionKind::DataAbort, instr_addr, &mut self.interrupts);
                return ExecOutcome::flushed(2);
            }
            self.registers.set(rd.value() as usize, result.value);
        } else {
            let value = if rd.value() as usize == PC { pc_plus_8 } else { self.registers.get(rd.value() as usize) };
            let result = transfer::store_sized(&mut self.write_map, transfer_addr, value, size, enforce_26bit);
            if result.address_exception {
                exception::raise(&mut self.registers, ExceptionKind::AddressException, instr_addr, &mut self.interrupts);
                return ExecOutcome::flushed(2);
            }
            if result.aborted {
                exception::raise(&mut self.registers, ExceptionKind::DataAbort, instr_addr, &mut self.interrupts);
                return ExecOutcome::flushed(2);
            }
        }

        if let Some(addr) = writeback_addr {
            self.registers.set(rn.value() as usize, addr);
        }

        if load && rd.value() as usize == PC {
            ExecOutcome::flushed(2)
        } else {
            ExecOutcome::simple(if load { 2 } else { 2 })
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_block_transfer(
        &mut self,
        instr_addr: Word,
        load: bool,
        pre_index: bool,
        up: bool,
        writeback: bool,
        load_psr_or_force_user: bool,
        rn: u4,
        register_list: u16,
    ) -> ExecOutcome {
        let base = self.registers.get(rn.value() as usize);
        let plan = transfer::plan_block_transfer(base, register_list, pre_index, up);
        let force_user = load_psr_or_force_user && !(register_list & (1 << PC) != 0);
        let mut addr = plan.start_address;
        let mut aborted = false;
        let pc_in_list = register_list & (1 << PC) != 0;

        for &reg in &plan.registers {
            if load {
                let result = transfer::load_word(&mut self.read_map, addr, false);
                if result.aborted {
                    aborted = true;
                    break;
                }
                if force_user {
                    self.registers.set_user(reg as usize, result.value);
                } else {
                    self.registers.set(reg as usize, result.value);
                }
            } else {
                let value = if force_user {
                    self.registers.get_user(reg as usize)
                } else {
                    self.registers.get(reg as usize)
                };
                let result = transfer::store_word(&mut self.write_map, addr, value, false);
                if result.aborted {
                    aborted = true;
                    break;
                }
            }
            addr = addr.wrapping_add(4);
        }

        if aborted {
            exception::raise(&mut self.registers, ExceptionKind::DataAbort, instr_addr, &mut self.interrupts);
            return ExecOutcome::flushed(plan.registers.len() as u32 + 2);
        }

        // LDM always writes back; STM suppresses it only when the base is the
        // lowest-numbered register in the transfer list.
        if writeback {
            let should_writeback = load || transfer::stm_writeback_applies(rn.value(), &plan.registers);
            if should_writeback {
                self.registers.set(rn.value() as usize, plan.final_address);
            }
        }

        if load && load_psr_or_force_user && pc_in_list {
            if !self.registers.mode().is_26bit() {
                let spsr = self.registers.get_spsr();
                self.registers.set_psr(spsr);
            }
        }

        if load && pc_in_list {
            ExecOutcome::flushed(plan.registers.len() as u32 + 2)
        } else {
            ExecOutcome::simple(plan.registers.len() as u32 + 1)
        }
    }

    fn exec_coproc_data_op(&mut self, coproc: u4, address: CoprocRegisterAddress) -> ExecOutcome {
        let mode = self.registers.mode();
        match self.coprocessors.slot_mut(coproc) {
            Some(slot) => {
                slot.sync_mode(mode);
                match slot.handle_data_op(address) {
                    CoprocResult::Handled(()) => ExecOutcome::simple(2),
                    CoprocResult::NotAccepted => {
                        exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, self.registers.get_pc(), &mut self.interrupts);
                        ExecOutcome::flushed(1)
                    }
                }
            }
            None => {
                exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, self.registers.get_pc(), &mut self.interrupts);
                ExecOutcome::flushed(1)
            }
        }
    }

    fn exec_coproc_register_transfer(&mut self, instr_addr: Word, load: bool, coproc: u4, address: CoprocRegisterAddress, rd: u4) -> ExecOutcome {
        let mode = self.registers.mode();
        match self.coprocessors.slot_mut(coproc) {
            Some(slot) => {
                slot.sync_mode(mode);
                if load {
                    match slot.handle_coproc_to_register(address) {
                        CoprocResult::Handled(value) => {
                            self.registers.set(rd.value() as usize, value);
                            ExecOutcome::simple(2)
                        }
                        CoprocResult::NotAccepted => {
                            exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, instr_addr, &mut self.interrupts);
                            ExecOutcome::flushed(1)
                        }
                    }
                } else {
                    let value = self.registers.get(rd.value() as usize);
                    match slot.handle_register_to_coproc(address, value) {
                        CoprocResult::Handled(()) => ExecOutcome::simple(2),
                        CoprocResult::NotAccepted => {
                            exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, instr_addr, &mut self.interrupts);
                            ExecOutcome::flushed(1)
                        }
                    }
                }
            }
            None => {
                exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, instr_addr, &mut self.interrupts);
                ExecOutcome::flushed(1)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_coproc_data_transfer(
        &mut self,
        instr_addr: Word,
        load: bool,
        long: bool,
        index: IndexMode,
        add: bool,
        coproc: u4,
        crd: u4,
        rn: u4,
        offset: u8,
    ) -> ExecOutcome {
        let base = self.registers.get(rn.value() as usize);
        let offset_value = (offset as Word) * 4;
        let offset_addr = if add { base.wrapping_add(offset_value) } else { base.wrapping_sub(offset_value) };
        let (addr, writeback_addr) = match index {
            IndexMode::PreIndexed { writeback } => (offset_addr, if writeback { Some(offset_addr) } else { None }),
            IndexMode::PostIndexed => (base, Some(offset_addr)),
        };

        let mode = self.registers.mode();
        let handled = match self.coprocessors.slot_mut(coproc) {
            Some(slot) => {
                slot.sync_mode(mode);
                if load {
                    let fetched = self.read_map.read_typed(addr);
                    if fetched.aborted {
                        exception::raise(&mut self.registers, ExceptionKind::DataAbort, instr_addr, &mut self.interrupts);
                        return ExecOutcome::flushed(2);
                    }
                    slot.handle_load(crd, addr, long)
                } else {
                    match slot.handle_store(crd, addr, long) {
                        CoprocResult::Handled(value) => {
                            self.write_map.write_typed(addr, value);
                            CoprocResult::Handled(())
                        }
                        CoprocResult::NotAccepted => CoprocResult::NotAccepted,
                    }
                }
            }
            None => CoprocResult::NotAccepted,
        };

        match handled {
            CoprocResult::Handled(()) => {
                if let Some(addr) = writeback_addr {
                    self.registers.set(rn.value() as usize, addr);
                }
                ExecOutcome::simple(2)
            }
            CoprocResult::NotAccepted => {
                exception::raise(&mut self.registers, ExceptionKind::UndefinedInstruction, instr_addr, &mut self.interrupts);
                ExecOutcome::flushed(1)
            }
        }
    }
}
