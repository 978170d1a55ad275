//! Disassembler: the inverse of `arm_emu_core::decode`. One formatter per
//! `Operation` variant, producing the mnemonic text `arm-emu-asm` would
//! read back (modulo whitespace), so the two crates can be round-tripped
//! against each other in tests.

use arm_emu_core::condition::Condition;
use arm_emu_core::decode::{self, AluOp, IndexMode, Offset, Operand2, Operation, ShiftAmount, ShiftKind, TransferSize};

fn register_name(n: u8) -> String {
    match n {
        13 => "sp".to_string(),
        14 => "lr".to_string(),
        15 => "pc".to_string(),
        n => format!("r{n}"),
    }
}

fn condition_suffix(condition: Condition) -> &'static str {
    match condition {
        Condition::Equal => "eq",
        Condition::NotEqual => "ne",
        Condition::CarrySet => "cs",
        Condition::CarryClear => "cc",
        Condition::Negative => "mi",
        Condition::Positive => "pl",
        Condition::OverflowSet => "vs",
        Condition::OverflowClear => "vc",
        Condition::Higher => "hi",
        Condition::LowerOrSame => "ls",
        Condition::GreaterEqual => "ge",
        Condition::LessThan => "lt",
        Condition::GreaterThan => "gt",
        Condition::LessEqual => "le",
        Condition::Always => "",
        Condition::Never => "nv",
    }
}

fn alu_mnemonic(op: AluOp) -> &'static str {
    match op {
        AluOp::And => "and",
        AluOp::Eor => "eor",
        AluOp::Sub => "sub",
        AluOp::Rsb => "rsb",
        AluOp::Add => "add",
        AluOp::Adc => "adc",
        AluOp::Sbc => "sbc",
        AluOp::Rsc => "rsc",
        AluOp::Tst => "tst",
        AluOp::Teq => "teq",
        AluOp::Cmp => "cmp",
        AluOp::Cmn => "cmn",
        AluOp::Orr => "orr",
        AluOp::Mov => "mov",
        AluOp::Bic => "bic",
        AluOp::Mvn => "mvn",
    }
}

fn shift_mnemonic(kind: ShiftKind) -> &'static str {
    match kind {
        ShiftKind::Lsl => "lsl",
        ShiftKind::Lsr => "lsr",
        ShiftKind::Asr => "asr",
        ShiftKind::Ror => "ror",
    }
}

fn format_operand2(operand2: Operand2) -> String {
    match operand2 {
        Operand2::Immediate { value, rotate } => {
            let rotated = (value as u32).rotate_right(rotate as u32);
            format!("#{rotated:#x}")
        }
        Operand2::Register { reg, shift_kind, shift_amount } => {
            let base = register_name(reg.value());
            match shift_amount {
                ShiftAmount::Immediate(0) if matches!(shift_kind, ShiftKind::Lsl) => base,
                ShiftAmount::Immediate(n) => format!("{base}, {} #{n}", shift_mnemonic(shift_kind)),
                ShiftAmount::Register(r) => format!("{base}, {} {}", shift_mnemonic(shift_kind), register_name(r.value())),
            }
        }
    }
}

fn format_offset(offset: Offset, add: bool) -> String {
    let sign = if add { "" } else { "-" };
    match offset {
        Offset::Immediate(value) => {
            if value.value() == 0 {
                String::new()
            } else {
                format!(", #{sign}{:#x}", value.value())
            }
        }
        Offset::Register { reg, shift_kind, shift_amount } => {
            let base = format!(", {sign}{}", register_name(reg.value()));
            if shift_amount == 0 && matches!(shift_kind, ShiftKind::Lsl) {
                base
            } else {
                format!("{base}, {} #{shift_amount}", shift_mnemonic(shift_kind))
            }
        }
    }
}

fn format_register_list(mask: u16) -> String {
    let regs: Vec<String> = (0..16).filter(|n| mask & (1 << n) != 0).map(register_name).collect();
    format!("{{{}}}", regs.join(", "))
}

/// Disassembles one instruction word. `address`, if given, resolves branch
/// targets to an absolute address instead of a PC-relative offset.
pub fn disassemble(word: u32, address: Option<u32>) -> String {
    let decoded = decode::decode(word);
    let cond = condition_suffix(decoded.condition);
    match decoded.operation {
        Operation::DataProcessing { op, set_flags, rn, rd, operand2 } => {
            let s = if set_flags && !op.is_comparison() { "s" } else { "" };
            let operand2 = format_operand2(operand2);
            if op.is_comparison() {
                format!("{}{cond} {}, {operand2}", alu_mnemonic(op), register_name(rn.value()))
            } else if matches!(op, AluOp::Mov | AluOp::Mvn) {
                format!("{}{s}{cond} {}, {operand2}", alu_mnemonic(op), register_name(rd.value()))
            } else {
                format!(
                    "{}{s}{cond} {}, {}, {operand2}",
                    alu_mnemonic(op),
                    register_name(rd.value()),
                    register_name(rn.value())
                )
            }
        }
        Operation::MultiplyShort { accumulate, set_flags, rd, rn, rs, rm } => {
            let s = if set_flags { "s" } else { "" };
            if accumulate {
                format!(
                    "mla{s}{cond} {}, {}, {}, {}",
                    register_name(rd.value()),
                    register_name(rm.value()),
                    register_name(rs.value()),
                    register_name(rn.value())
                )
            } else {
                format!("mul{s}{cond} {}, {}, {}", register_name(rd.value()), register_name(rm.value()), register_name(rs.value()))
            }
        }
        Operation::MultiplyLong {
            signed,
            accumulate,
            set_flags,
            rd_hi,
            rd_lo,
            rs,
            rm,
        } => {
            let s = if set_flags { "s" } else { "" };
            let sign = if signed { "s" } else { "u" };
            let op = if accumulate { "mlal" } else { "mull" };
            format!(
                "{sign}{op}{s}{cond} {}, {}, {}, {}",
                register_name(rd_lo.value()),
                register_name(rd_hi.value()),
                register_name(rm.value()),
                register_name(rs.value())
            )
        }
        Operation::SingleTransfer { load, size, index, add, rn, rd, offset, .. } => {
            let op = if load { "ldr" } else { "str" };
            let width = match size {
                TransferSize::Word => "",
                TransferSize::UnsignedByte => "b",
                TransferSize::SignedByte => "sb",
                TransferSize::UnsignedHalfWord => "h",
                TransferSize::SignedHalfWord => "sh",
            };
            let offset_text = format_offset(offset, add);
            let rn_name = register_name(rn.value());
            match index {
                IndexMode::PreIndexed { writeback } => {
                    let bang = if writeback { "!" } else { "" };
                    format!("{op}{cond}{width} {}, [{rn_name}{offset_text}]{bang}", register_name(rd.value()))
                }
                IndexMode::PostIndexed => format!("{op}{cond}{width} {}, [{rn_name}]{offset_text}", register_name(rd.value())),
            }
        }
        Operation::BlockTransfer {
            load,
            pre_index,
            up,
            writeback,
            rn,
            register_list,
            ..
        } => {
            let op = if load { "ldm" } else { "stm" };
            let suffix = match (pre_index, up) {
                (false, true) => "ia",
                (true, true) => "ib",
                (false, false) => "da",
                (true, false) => "db",
            };
            let bang = if writeback { "!" } else { "" };
            format!("{op}{cond}{suffix} {}{bang}, {}", register_name(rn.value()), format_register_list(register_list))
        }
        Operation::Branch { link, offset } => {
            let mnemonic = if link { "bl" } else { "b" };
            match address {
                Some(address) => {
                    let target = (address as i64 + 8 + offset as i64) as u32;
                    format!("{mnemonic}{cond} #{target:#x}")
                }
                None => format!("{mnemonic}{cond} #{offset:+#x}"),
            }
        }
        Operation::BranchExchange { rm } => format!("bx{cond} {}", register_name(rm.value())),
        Operation::SoftwareInterrupt { comment } => format!("swi{cond} #{:#x}", comment.value()),
        Operation::Breakpoint { comment } => format!("bkpt #{comment:#x}"),
        Operation::Swap { byte, rn, rd, rm } => {
            let width = if byte { "b" } else { "" };
            format!(
                "swp{cond}{width} {}, {}, [{}]",
                register_name(rd.value()),
                register_name(rm.value()),
                register_name(rn.value())
            )
        }
        Operation::CoprocessorDataOperation { coproc, opcode, crn, crd, crm, op2 } => format!(
            "cdp{cond} p{}, {}, c{}, c{}, c{}, {}",
            coproc.value(),
            opcode.value(),
            crd.value(),
            crn.value(),
            crm.value(),
            op2.value()
        ),
        Operation::CoprocessorRegisterTransfer {
            load,
            coproc,
            opcode,
            crn,
            rd,
            crm,
            op2,
        } => {
            let mnemonic = if load { "mrc" } else { "mcr" };
            format!(
                "{mnemonic}{cond} p{}, {}, {}, c{}, c{}, {}",
                coproc.value(),
                opcode.value(),
                register_name(rd.value()),
                crn.value(),
                crm.value(),
                op2.value()
            )
        }
        Operation::CoprocessorDataTransfer { load, long, index, add, coproc, crd, rn, offset } => {
            let mnemonic = if load { "ldc" } else { "stc" };
            let l = if long { "l" } else { "" };
            let sign = if add { "" } else { "-" };
            let offset_text = if offset == 0 { String::new() } else { format!(", #{sign}{:#x}", (offset as u32) << 2) };
            let rn_name = register_name(rn.value());
            match index {
                IndexMode::PreIndexed { writeback } => {
                    let bang = if writeback { "!" } else { "" };
                    format!("{mnemonic}{cond}{l} p{}, c{}, [{rn_name}{offset_text}]{bang}", coproc.value(), crd.value())
                }
                IndexMode::PostIndexed => format!("{mnemonic}{cond}{l} p{}, c{}, [{rn_name}]{offset_text}", coproc.value(), crd.value()),
            }
        }
        Operation::PsrTransfer { to_psr, use_spsr, operand2, field_mask, rd } => {
            let psr = if use_spsr { "SPSR" } else { "CPSR" };
            if to_psr {
                let fields = format_psr_field_mask(field_mask.value());
                format!("msr{cond} {psr}_{fields}, {}", format_operand2(operand2))
            } else {
                format!("mrs{cond} {}, {psr}", register_name(rd.value()))
            }
        }
        Operation::Undefined => format!("undefined{cond}"),
    }
}

fn format_psr_field_mask(mask: u8) -> String {
    let mut fields = String::new();
    if mask & 0b0001 != 0 {
        fields.push('c');
    }
    if mask & 0b0010 != 0 {
        fields.push('x');
    }
    if mask & 0b0100 != 0 {
        fields.push('s');
    }
    if mask & 0b1000 != 0 {
        fields.push('f');
    }
    if fields.is_empty() {
        fields.push_str("cf");
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_mov_immediate() {
        assert_eq!(disassemble(0xE3B0_0001, None), "movs r0, #0x1");
    }

    #[test]
    fn disassembles_branch_exchange() {
        assert_eq!(disassemble(0xE12F_FF1E, None), "bx lr");
    }

    #[test]
    fn disassembles_branch_with_resolved_target() {
        assert_eq!(disassemble(0xEAFF_FFFE, Some(0)), "b #0x0");
    }

    #[test]
    fn disassembles_mrc() {
        assert_eq!(disassemble(0xEE10_0F10, None), "mrc p15, 0, r0, c0, c0, 0");
    }

    #[test]
    fn disassembles_single_word_load() {
        assert_eq!(disassemble(0xE591_1004, None), "ldr r1, [r0, #0x4]");
    }
}
