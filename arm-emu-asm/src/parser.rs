//! Turns one tokenized source line into a [`Statement`]. Mnemonics are
//! split into (base, condition, set-flags) the way the ARM data sheet reads
//! them: `<op>{cond}{S}`. Scoped to the instruction classes the seed and
//! benchmark programs exercise plus their near neighbors (full data-processing
//! set, single transfer, block transfer, branch family, coprocessor
//! dispatch, SWI/BKPT/SWP) — not the full grammar `original_source/AsmTools`
//! implements.

use arm_emu_core::condition::Condition;
use arm_emu_core::decode::{AluOp, ShiftKind};

use crate::ast::{AddressingSrc, Insn, Operand2Src, OffsetSrc, ShiftAmountSrc, Statement, TransferWidth, parse_register};
use crate::error::AsmError;
use crate::lexer::{tokenize, Token};

const CONDITIONS: &[(&str, Condition)] = &[
    ("EQ", Condition::Equal),
    ("NE", Condition::NotEqual),
    ("CS", Condition::CarrySet),
    ("HS", Condition::CarrySet),
    ("CC", Condition::CarryClear),
    ("LO", Condition::CarryClear),
    ("MI", Condition::Negative),
    ("PL", Condition::Positive),
    ("VS", Condition::OverflowSet),
    ("VC", Condition::OverflowClear),
    ("HI", Condition::Higher),
    ("LS", Condition::LowerOrSame),
    ("GE", Condition::GreaterEqual),
    ("LT", Condition::LessThan),
    ("GT", Condition::GreaterThan),
    ("LE", Condition::LessEqual),
    ("AL", Condition::Always),
    ("NV", Condition::Never),
];

const ALU_MNEMONICS: &[(&str, AluOp)] = &[
    ("AND", AluOp::And),
    ("EOR", AluOp::Eor),
    ("SUB", AluOp::Sub),
    ("RSB", AluOp::Rsb),
    ("ADD", AluOp::Add),
    ("ADC", AluOp::Adc),
    ("SBC", AluOp::Sbc),
    ("RSC", AluOp::Rsc),
    ("TST", AluOp::Tst),
    ("TEQ", AluOp::Teq),
    ("CMP", AluOp::Cmp),
    ("CMN", AluOp::Cmn),
    ("ORR", AluOp::Orr),
    ("MOV", AluOp::Mov),
    ("BIC", AluOp::Bic),
    ("MVN", AluOp::Mvn),
];

struct Split {
    base: String,
    condition: Condition,
    set_flags: bool,
}

/// Peels `{cond}` and, for ALU mnemonics, a trailing `S` off a mnemonic
/// token. The order matters: `S` is the outermost suffix (`ADD{cond}{S}`),
/// so it is stripped first, then a 2-letter condition code is looked for
/// on what remains. Comparison ops (`CMP`/`CMN`/`TST`/`TEQ`) always set
/// flags architecturally regardless of whether `S` was written.
fn split_mnemonic(token: &str) -> Split {
    let upper = token.to_ascii_uppercase();

    // `BASE{cond}S` — condition code sandwiched between base and trailing S.
    if let Some(without_s) = upper.strip_suffix('S') {
        if without_s.len() > 2 {
            let (head, tail) = without_s.split_at(without_s.len() - 2);
            if let Some((_, cond)) = CONDITIONS.iter().find(|(name, _)| *name == tail) {
                if let Some((name, _)) = ALU_MNEMONICS.iter().find(|(name, _)| *name == head) {
                    return Split {
                        base: name.to_string(),
                        condition: *cond,
                        set_flags: true,
                    };
                }
            }
        }
        // `BASES` — bare ALU mnemonic plus S, no condition.
        if let Some((name, _)) = ALU_MNEMONICS.iter().find(|(name, _)| *name == without_s) {
            return Split {
                base: name.to_string(),
                condition: Condition::Always,
                set_flags: true,
            };
        }
    }

    // `BASE{cond}` — condition code with no S.
    if upper.len() > 2 {
        let (head, tail) = upper.split_at(upper.len() - 2);
        if let Some((_, cond)) = CONDITIONS.iter().find(|(name, _)| *name == tail) {
            if let Some((name, op)) = ALU_MNEMONICS.iter().find(|(name, _)| *name == head) {
                return Split {
                    base: name.to_string(),
                    condition: *cond,
                    set_flags: op.is_comparison(),
                };
            }
            if is_known_base(head) {
                return Split {
                    base: head.to_string(),
                    condition: *cond,
                    set_flags: false,
                };
            }
        }
    }

    if let Some((name, op)) = ALU_MNEMONICS.iter().find(|(name, _)| *name == upper.as_str()) {
        return Split {
            base: name.to_string(),
            condition: Condition::Always,
            set_flags: op.is_comparison(),
        };
    }
    Split {
        base: upper,
        condition: Condition::Always,
        set_flags: false,
    }
}

fn is_known_base(base: &str) -> bool {
    matches!(
        base,
        "LDR" | "STR" | "LDM" | "STM" | "B" | "BL" | "BX" | "SWI" | "SWP" | "SWPB" | "MRC" | "MCR" | "CDP" | "MRS" | "MSR" | "BKPT"
    ) || ALU_MNEMONICS.iter().any(|(name, _)| *name == base)
        || (base.len() > 3 && (base.starts_with("LDM") || base.starts_with("STM")))
}

pub fn parse_line(line: &str, line_no: usize) -> Result<Vec<Statement>, AsmError> {
    let tokens = tokenize(line).map_err(|message| AsmError::Syntax { line: line_no, message })?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let mut idx = 0;

    // A leading `label:` may be followed by an instruction on the same line.
    if let Token::Ident(name) = &tokens[0] {
        if tokens.get(1) == Some(&Token::Colon) {
            out.push(Statement::Label(name.clone()));
            idx = 2;
        }
    }
    if idx >= tokens.len() {
        return Ok(out);
    }

    let Token::Ident(mnemonic) = &tokens[idx] else {
        return Err(err(line_no, "expected an instruction mnemonic"));
    };
    let rest = &tokens[idx + 1..];

    if mnemonic.eq_ignore_ascii_case(".word") || mnemonic.eq_ignore_ascii_case("dcd") {
        let value = parse_number(rest, line_no)?;
        out.push(Statement::Word(value));
        return Ok(out);
    }

    let split = split_mnemonic(mnemonic);
    let condition = split.condition;
    let insn = parse_instruction(&split.base, split.set_flags, rest, line_no)?;
    out.push(Statement::Instruction { condition, insn });
    Ok(out)
}

fn err(line: usize, message: impl Into<String>) -> AsmError {
    AsmError::Syntax { line, message: message.into() }
}

fn parse_number(tokens: &[Token], line_no: usize) -> Result<i64, AsmError> {
    let mut tokens = tokens;
    let mut negative = false;
    if tokens.first() == Some(&Token::Minus) {
        negative = true;
        tokens = &tokens[1..];
    }
    match tokens.first() {
        Some(Token::Number(n)) => Ok(if negative { -*n } else { *n }),
        _ => Err(err(line_no, "expected a numeric literal")),
    }
}

fn parse_register_token(token: &Token, line_no: usize) -> Result<u8, AsmError> {
    match token {
        Token::Ident(name) => parse_register(name).ok_or_else(|| err(line_no, format!("'{name}' is not a register"))),
        other => Err(err(line_no, format!("expected a register, found {other:?}"))),
    }
}

fn parse_shift_kind(name: &str) -> Option<ShiftKind> {
    match name.to_ascii_uppercase().as_str() {
        "LSL" | "ASL" => Some(ShiftKind::Lsl),
        "LSR" => Some(ShiftKind::Lsr),
        "ASR" => Some(ShiftKind::Asr),
        "ROR" => Some(ShiftKind::Ror),
        _ => None,
    }
}

/// Parses the tail of an operand list (after the mandatory register(s))
/// into a shifted-register or immediate `Operand2Src`.
fn parse_operand2(tokens: &[Token], line_no: usize) -> Result<Operand2Src, AsmError> {
    if tokens.first() == Some(&Token::Hash) {
        let value = parse_number(&tokens[1..], line_no)?;
        return Ok(Operand2Src::Immediate(value));
    }
    let reg = parse_register_token(tokens.first().ok_or_else(|| err(line_no, "expected an operand"))?, line_no)?;
    if tokens.len() == 1 {
        return Ok(Operand2Src::Register { reg, shift: None, rrx: false });
    }
    let Some(Token::Comma) = tokens.get(1) else {
        return Err(err(line_no, "expected ',' before a shift specifier"));
    };
    let Some(Token::Ident(shift_name)) = tokens.get(2) else {
        return Err(err(line_no, "expected a shift mnemonic"));
    };
    if shift_name.eq_ignore_ascii_case("RRX") {
        return Ok(Operand2Src::Register { reg, shift: None, rrx: true });
    }
    let kind = parse_shift_kind(shift_name).ok_or_else(|| err(line_no, format!("'{shift_name}' is not a shift mnemonic")))?;
    let amount_tokens = &tokens[3..];
    let amount = if amount_tokens.first() == Some(&Token::Hash) {
        ShiftAmountSrc::Immediate(parse_number(&amount_tokens[1..], line_no)? as u8)
    } else {
        ShiftAmountSrc::Register(parse_register_token(amount_tokens.first().ok_or_else(|| err(line_no, "expected a shift amount"))?, line_no)?)
    };
    Ok(Operand2Src::Register {
        reg,
        shift: Some((kind, amount)),
        rrx: false,
    })
}

/// Parses a `[Rn ...]` / `[Rn], ...` addressing form.
fn parse_addressing(tokens: &[Token], line_no: usize) -> Result<AddressingSrc, AsmError> {
    if tokens.first() != Some(&Token::LBracket) {
        return Err(err(line_no, "expected '['"));
    }
    let close = tokens
        .iter()
        .position(|t| *t == Token::RBracket)
        .ok_or_else(|| err(line_no, "missing ']'"))?;
    let inner = &tokens[1..close];
    let after = &tokens[close + 1..];

    let rn = parse_register_token(inner.first().ok_or_else(|| err(line_no, "expected a base register"))?, line_no)?;
    let offset_tokens = if inner.len() > 1 && inner[1] == Token::Comma { &inner[2..] } else { &[] };

    if offset_tokens.is_empty() && !after.is_empty() {
        // Post-indexed: `[Rn], #imm` or `[Rn], Rm`.
        let Token::Comma = after[0] else {
            return Err(err(line_no, "expected ',' after ']' in post-indexed form"));
        };
        let offset = parse_offset(&after[1..], line_no)?;
        return Ok(AddressingSrc::PostIndexed { rn, offset });
    }

    let offset = if offset_tokens.is_empty() {
        OffsetSrc::Immediate(0)
    } else {
        parse_offset(offset_tokens, line_no)?
    };
    let writeback = after.first() == Some(&Token::Bang);
    Ok(AddressingSrc::PreIndexed { rn, offset, writeback })
}

fn parse_offset(tokens: &[Token], line_no: usize) -> Result<OffsetSrc, AsmError> {
    if tokens.first() == Some(&Token::Hash) {
        let value = parse_number(&tokens[1..], line_no)? as i32;
        return Ok(OffsetSrc::Immediate(value));
    }
    let (add, tokens) = if tokens.first() == Some(&Token::Minus) { (false, &tokens[1..]) } else { (true, tokens) };
    let reg = parse_register_token(tokens.first().ok_or_else(|| err(line_no, "expected a register offset"))?, line_no)?;
    Ok(OffsetSrc::Register { reg, add, shift: None })
}

fn parse_register_list(tokens: &[Token], line_no: usize) -> Result<u16, AsmError> {
    if tokens.first() != Some(&Token::LBrace) {
        return Err(err(line_no, "expected '{' to start a register list"));
    }
    let close = tokens
        .iter()
        .position(|t| *t == Token::RBrace)
        .ok_or_else(|| err(line_no, "missing '}'"))?;
    let mut mask = 0u16;
    let mut i = 1;
    while i < close {
        let first = parse_register_token(&tokens[i], line_no)?;
        if tokens.get(i + 1) == Some(&Token::Minus) {
            let last = parse_register_token(&tokens[i + 2], line_no)?;
            for r in first..=last {
                mask |= 1 << r;
            }
            i += 3;
        } else {
            mask |= 1 << first;
            i += 1;
        }
        if tokens.get(i) == Some(&Token::Comma) {
            i += 1;
        }
    }
    Ok(mask)
}

fn parse_instruction(base: &str, set_flags: bool, tokens: &[Token], line_no: usize) -> Result<Insn, AsmError> {
    if let Some((_, op)) = ALU_MNEMONICS.iter().find(|(name, _)| *name == base) {
        return parse_data_processing(*op, set_flags, tokens, line_no);
    }

    match base {
        "MRS" => {
            let rd = parse_register_token(&tokens[0], line_no)?;
            let use_spsr = matches!(tokens.get(2), Some(Token::Ident(name)) if name.eq_ignore_ascii_case("SPSR"));
            Ok(Insn::Mrs { rd, use_spsr })
        }
        "MSR" => {
            let Token::Ident(dest) = &tokens[0] else {
                return Err(err(line_no, "expected CPSR or SPSR"));
            };
            let (use_spsr, field_mask) = parse_psr_dest(dest, line_no)?;
            let operand2 = parse_operand2(&tokens[2..], line_no)?;
            Ok(Insn::Msr {
                use_spsr,
                field_mask,
                operand2,
            })
        }
        "MUL" | "MLA" => {
            let rd = parse_register_token(&tokens[0], line_no)?;
            let rm = parse_register_token(&tokens[2], line_no)?;
            let rs = parse_register_token(&tokens[4], line_no)?;
            let rn = if base == "MLA" { parse_register_token(&tokens[6], line_no)? } else { 0 };
            Ok(Insn::Mul {
                accumulate: base == "MLA",
                set_flags,
                rd,
                rm,
                rs,
                rn,
            })
        }
        "LDR" | "STR" | "LDRB" | "STRB" => {
            let load = base.starts_with('L');
            let width = if base.ends_with('B') { TransferWidth::Byte } else { TransferWidth::Word };
            let rd = parse_register_token(&tokens[0], line_no)?;
            if load && tokens.len() > 2 {
                if let Token::Ident(ident) = &tokens[2] {
                    if let Some(stripped) = ident.strip_prefix('=') {
                        let value = parse_literal_expr(stripped, line_no)?;
                        return Ok(Insn::LoadLiteral { rd, value });
                    }
                }
            }
            let addr = parse_addressing(&tokens[2..], line_no)?;
            Ok(Insn::SingleTransfer { load, width, rd, addr })
        }
        "LDM" | "STM" => Err(err(line_no, "LDM/STM base mnemonic must carry an addressing suffix (IA/IB/DA/DB)")),
        b if b.starts_with("LDM") || b.starts_with("STM") => parse_block_transfer(b, tokens, line_no),
        "B" => Ok(Insn::Branch {
            link: false,
            target: expect_label(tokens, line_no)?,
        }),
        "BL" => Ok(Insn::Branch {
            link: true,
            target: expect_label(tokens, line_no)?,
        }),
        "BX" => Ok(Insn::BranchExchange {
            rm: parse_register_token(&tokens[0], line_no)?,
        }),
        "SWI" | "SVC" => {
            let comment = parse_number(tokens, line_no)? as u32;
            Ok(Insn::SoftwareInterrupt { comment })
        }
        "BKPT" => {
            let comment = parse_number(tokens, line_no)? as u16;
            Ok(Insn::Breakpoint { comment })
        }
        "SWP" | "SWPB" => {
            let rd = parse_register_token(&tokens[0], line_no)?;
            let rm = parse_register_token(&tokens[2], line_no)?;
            let rn_tokens = &tokens[4..];
            let close = rn_tokens.iter().position(|t| *t == Token::RBracket).ok_or_else(|| err(line_no, "missing ']'"))?;
            let rn = parse_register_token(&rn_tokens[1..close][0], line_no)?;
            Ok(Insn::Swap { byte: base == "SWPB", rn, rd, rm })
        }
        "CDP" => {
            let coproc = parse_coproc_token(&tokens[0], line_no)?;
            let opcode = parse_number(&tokens[2..], line_no)? as u8;
            let crd = parse_cr_token(&tokens[4], line_no)?;
            let crn = parse_cr_token(&tokens[6], line_no)?;
            let crm = parse_cr_token(&tokens[8], line_no)?;
            let op2 = tokens.get(10).map(|_| parse_number(&tokens[10..], line_no)).transpose()?.unwrap_or(0) as u8;
            Ok(Insn::Cdp { coproc, opcode, crn, crd, crm, op2 })
        }
        "MRC" | "MCR" => {
            let coproc = parse_coproc_token(&tokens[0], line_no)?;
            let opcode = parse_number(&tokens[2..], line_no)? as u8;
            let rd = parse_register_token(&tokens[4], line_no)?;
            let crn = parse_cr_token(&tokens[6], line_no)?;
            let crm = parse_cr_token(&tokens[8], line_no)?;
            let op2 = tokens.get(10).map(|_| parse_number(&tokens[10..], line_no)).transpose()?.unwrap_or(0) as u8;
            if base == "MRC" {
                Ok(Insn::Mrc { coproc, opcode, crn, rd, crm, op2 })
            } else {
                Ok(Insn::Mcr { coproc, opcode, crn, rd, crm, op2 })
            }
        }
        other => Err(err(line_no, format!("unsupported mnemonic '{other}'"))),
    }
}

fn parse_data_processing(op: AluOp, set_flags: bool, tokens: &[Token], line_no: usize) -> Result<Insn, AsmError> {
    if op.is_comparison() {
        let rn = parse_register_token(&tokens[0], line_no)?;
        let operand2 = parse_operand2(&tokens[2..], line_no)?;
        return Ok(Insn::DataProcessing {
            op,
            set_flags: true,
            rd: 0,
            rn,
            operand2,
        });
    }
    if matches!(op, AluOp::Mov | AluOp::Mvn) {
        let rd = parse_register_token(&tokens[0], line_no)?;
        let operand2 = parse_operand2(&tokens[2..], line_no)?;
        return Ok(Insn::DataProcessing {
            op,
            set_flags,
            rd,
            rn: 0,
            operand2,
        });
    }
    let rd = parse_register_token(&tokens[0], line_no)?;
    let rn = parse_register_token(&tokens[2], line_no)?;
    let operand2 = parse_operand2(&tokens[4..], line_no)?;
    Ok(Insn::DataProcessing { op, set_flags, rd, rn, operand2 })
}

fn parse_block_transfer(base: &str, tokens: &[Token], line_no: usize) -> Result<Insn, AsmError> {
    let load = base.starts_with('L');
    let suffix = &base[3..];
    let (pre_index, up) = match suffix {
        "IA" | "FD" => (false, true),
        "IB" | "ED" => (true, true),
        "DA" | "FA" => (false, false),
        "DB" | "EA" => (true, false),
        _ => return Err(err(line_no, format!("unknown block-transfer suffix '{suffix}'"))),
    };
    let rn = parse_register_token(&tokens[0], line_no)?;
    let writeback = tokens.get(1) == Some(&Token::Bang);
    let list_start = if writeback { 2 } else { 1 };
    let list_tokens = &tokens[list_start..];
    let after_brace = list_tokens.iter().position(|t| *t == Token::RBrace).map(|p| p + 1).unwrap_or(list_tokens.len());
    let register_list = parse_register_list(list_tokens, line_no)?;
    let user_bank = list_tokens.get(after_brace) == Some(&Token::Caret);
    Ok(Insn::BlockTransfer {
        load,
        pre_index,
        up,
        writeback,
        user_bank,
        rn,
        register_list,
    })
}

fn parse_psr_dest(name: &str, line_no: usize) -> Result<(bool, u8), AsmError> {
    let mut parts = name.splitn(2, '_');
    let reg = parts.next().unwrap_or_default();
    let fields = parts.next().unwrap_or("cf");
    let use_spsr = reg.eq_ignore_ascii_case("SPSR");
    if !use_spsr && !reg.eq_ignore_ascii_case("CPSR") {
        return Err(err(line_no, format!("'{name}' is not CPSR or SPSR")));
    }
    let mut mask = 0u8;
    for ch in fields.chars() {
        match ch.to_ascii_lowercase() {
            'c' => mask |= 0b0001,
            'x' => mask |= 0b0010,
            's' => mask |= 0b0100,
            'f' => mask |= 0b1000,
            _ => return Err(err(line_no, format!("unknown PSR field selector '{ch}'"))),
        }
    }
    Ok((use_spsr, mask))
}

fn expect_label(tokens: &[Token], line_no: usize) -> Result<String, AsmError> {
    match tokens.first() {
        Some(Token::Ident(name)) => Ok(name.clone()),
        _ => Err(err(line_no, "expected a branch target label")),
    }
}

fn parse_coproc_token(token: &Token, line_no: usize) -> Result<u8, AsmError> {
    match token {
        Token::Ident(name) => {
            let digits = name.trim_start_matches(|c: char| !c.is_ascii_digit());
            digits.parse().map_err(|_| err(line_no, format!("'{name}' is not a coprocessor number")))
        }
        other => Err(err(line_no, format!("expected a coprocessor operand, found {other:?}"))),
    }
}

fn parse_cr_token(token: &Token, line_no: usize) -> Result<u8, AsmError> {
    parse_coproc_token(token, line_no)
}

fn parse_literal_expr(text: &str, line_no: usize) -> Result<i64, AsmError> {
    let tokens = tokenize(text).map_err(|message| AsmError::Syntax { line: line_no, message })?;
    parse_number(&tokens, line_no)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_movs_into_mov_plus_set_flags() {
        let split = split_mnemonic("MOVS");
        assert_eq!(split.base, "MOV");
        assert!(split.set_flags);
        assert_eq!(split.condition, Condition::Always);
    }

    #[test]
    fn parses_mov_immediate() {
        let statements = parse_line("MOV R0, #42", 1).unwrap();
        assert_eq!(
            statements,
            vec![Statement::Instruction {
                condition: Condition::Always,
                insn: Insn::DataProcessing {
                    op: AluOp::Mov,
                    set_flags: false,
                    rd: 0,
                    rn: 0,
                    operand2: Operand2Src::Immediate(42),
                },
            }]
        );
    }

    #[test]
    fn parses_label_and_branch() {
        let statements = parse_line("loop: B loop", 1).unwrap();
        assert_eq!(statements[0], Statement::Label("loop".into()));
        assert_eq!(
            statements[1],
            Statement::Instruction {
                condition: Condition::Always,
                insn: Insn::Branch { link: false, target: "loop".into() },
            }
        );
    }

    #[test]
    fn parses_pre_indexed_writeback_load() {
        let statements = parse_line("LDR R1,[R0,#3]!", 1).unwrap();
        match &statements[0] {
            Statement::Instruction { insn: Insn::SingleTransfer { addr, .. }, .. } => {
                assert_eq!(
                    *addr,
                    AddressingSrc::PreIndexed {
                        rn: 0,
                        offset: OffsetSrc::Immediate(3),
                        writeback: true,
                    }
                );
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }
}
