//! Two-pass assembler: addresses are assigned to every statement first (so
//! forward branches and `LDR Rd, =literal` pseudo-ops can be resolved),
//! then every instruction is encoded with its label references already
//! turned into concrete offsets.

use std::collections::HashMap;

use crate::ast::{Insn, Statement};
use crate::encode;
use crate::error::AsmError;
use crate::parser::parse_line;

const INSTRUCTION_SIZE: u32 = 4;

/// One fully assembled program: the instruction/data stream plus the
/// trailing literal pool `LDR Rd, =expr` pseudo-ops were rewritten into.
pub struct Assembled {
    pub words: Vec<u32>,
    pub origin: u32,
}

/// Assembles source text into a flat word stream starting at `origin`.
/// A leading `;` or `@` starts a line comment; blank lines are skipped.
pub fn assemble(source: &str, origin: u32) -> Result<Assembled, AsmError> {
    let mut statements = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        statements.extend(parse_line(line, line_no + 1)?);
    }

    let (statements, literal_pool) = resolve_literal_pool(statements);

    let mut labels = HashMap::new();
    let mut address = origin;
    for statement in &statements {
        match statement {
            Statement::Label(name) => {
                if labels.insert(name.clone(), address).is_some() {
                    return Err(AsmError::DuplicateLabel(name.clone()));
                }
            }
            Statement::Word(_) | Statement::Instruction { .. } => address += INSTRUCTION_SIZE,
        }
    }
    let pool_base = address;
    for (index, _) in literal_pool.iter().enumerate() {
        labels.insert(pool_label(index), pool_base + index as u32 * INSTRUCTION_SIZE);
    }

    let mut words = Vec::new();
    let mut pc = origin;
    for (line_no, statement) in statement_lines(&statements) {
        match statement {
            Statement::Label(_) => continue,
            Statement::Word(value) => {
                words.push(*value as u32);
                pc += INSTRUCTION_SIZE;
            }
            Statement::Instruction { condition, insn } => {
                let fetch_pc = pc + 8; // ARM's PC reads 8 ahead of the executing instruction.
                let word = match insn {
                    Insn::Branch { link, target } => {
                        let target_addr = *labels.get(target).ok_or_else(|| AsmError::UndefinedLabel(target.clone()))?;
                        let raw = encode::encode(*condition, insn, line_no, pc)?;
                        encode::patch_branch_offset(raw, target_addr as i32 - fetch_pc as i32, target)?
                    }
                    Insn::LoadLiteral { rd, value } => {
                        let index = literal_pool.iter().position(|v| *v == *value).expect("literal was pooled in the first pass");
                        let literal_addr = *labels.get(&pool_label(index)).expect("pool label was registered above");
                        let load = crate::ast::Insn::SingleTransfer {
                            load: true,
                            width: crate::ast::TransferWidth::Word,
                            rd: *rd,
                            addr: crate::ast::AddressingSrc::PreIndexed {
                                rn: 15,
                                offset: crate::ast::OffsetSrc::Immediate(literal_addr as i32 - fetch_pc as i32),
                                writeback: false,
                            },
                        };
                        encode::encode(*condition, &load, line_no, pc)?
                    }
                    _ => encode::encode(*condition, insn, line_no, pc)?,
                };
                words.push(word);
                pc += INSTRUCTION_SIZE;
            }
        }
    }
    for value in &literal_pool {
        words.push(*value as u32);
    }

    Ok(Assembled { words, origin })
}

fn pool_label(index: usize) -> String {
    format!("__literal_pool_{index}")
}

fn statement_lines(statements: &[Statement]) -> impl Iterator<Item = (usize, &Statement)> {
    statements.iter().enumerate().map(|(i, s)| (i + 1, s))
}

/// Collects every distinct literal value an `LDR Rd, =expr` referenced so
/// the caller can lay down one trailing pool entry per distinct value,
/// rather than one per use site.
fn resolve_literal_pool(statements: Vec<Statement>) -> (Vec<Statement>, Vec<i64>) {
    let mut pool = Vec::new();
    for statement in &statements {
        if let Statement::Instruction { insn: Insn::LoadLiteral { value, .. }, .. } = statement {
            if !pool.contains(value) {
                pool.push(*value);
            }
        }
    }
    (statements, pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_mov_immediate() {
        let out = assemble("MOVS R0, #1\n", 0).unwrap();
        assert_eq!(out.words, vec![0xE3B0_0001]);
    }

    #[test]
    fn assembles_backward_branch_to_self() {
        let out = assemble("loop: B loop\n", 0).unwrap();
        // B with offset -2 words (branch instruction re-targets itself,
        // accounting for the +8 prefetch).
        assert_eq!(out.words, vec![0xEAFF_FFFE]);
    }

    #[test]
    fn assembles_forward_branch() {
        let source = "B skip\nMOV R0, #0\nskip: MOV R1, #1\n";
        let out = assemble(source, 0).unwrap();
        assert_eq!(out.words[0], 0xEA00_0000);
        assert_eq!(out.words[2], 0xE3A0_1001);
    }

    #[test]
    fn undefined_label_is_an_error() {
        let err = assemble("B nowhere\n", 0).unwrap_err();
        assert_eq!(err, AsmError::UndefinedLabel("nowhere".into()));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let err = assemble("a: MOV R0, #0\na: MOV R0, #1\n", 0).unwrap_err();
        assert_eq!(err, AsmError::DuplicateLabel("a".into()));
    }

    #[test]
    fn load_literal_pseudo_op_appends_a_pool_entry() {
        let out = assemble("LDR R0, =0x12345678\n", 0).unwrap();
        assert_eq!(out.words.len(), 2);
        assert_eq!(out.words[1], 0x1234_5678);
    }
}
