//! Parses the comma-separated `ID=VALUE` constraint mini-language into a
//! [`ConstraintCollection`].
//!
//! Grounded on `original_source/ArmEmu/TestConstraints.cpp`'s
//! `parseConstraints`/`tryProcessConstraint`/`compileConstraints`: the same
//! prefix table (`R`/`A`/`V` core register aliases, `C`/`CP` coprocessor
//! context, `CR` coprocessor register, `F` FPA register, bare name falling
//! back to a system register) and the same two-pass coprocessor binding
//! (`CPn` sets the "current" coprocessor; a following `CRm=v` inherits it).
//! The original drives this with a hand-rolled character state machine;
//! since none of the token grammar's punctuation (`=`, `[`, `]`) can appear
//! inside a memory address literal, splitting on top-level commas first and
//! parsing each token independently is equivalent and reads more plainly.
//! Numeric literals add an `&hex` form and the memory/`Status` syntax beyond
//! what the original parses, both noted in `constraint.rs`.

use thiserror::Error;

use crate::constraint::{mode_by_name, Constraint, ConstraintCollection, Location, MemoryKind, SystemRegister};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("constraint '{token}': {message}")]
    Syntax { token: String, message: String },
    #[error("'{0}' was not assigned to a parent co-processor")]
    UnboundCoprocRegister(String),
    #[error("duplicate constraint for '{0}'")]
    Duplicate(String),
}

fn syntax(token: &str, message: impl Into<String>) -> ConstraintError {
    ConstraintError::Syntax {
        token: token.to_string(),
        message: message.into(),
    }
}

/// Splits on commas that aren't inside a `[...]` address bracket.
fn split_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                tokens.push(text[start..i].trim());
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        tokens.push(last);
    }
    tokens
}

fn parse_numeric(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2).ok()
    } else if let Some(hex) = text.strip_prefix('&') {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse::<u32>().ok()
    }
}

fn parse_memory_id(id_part: &str) -> Option<(MemoryKind, u32)> {
    let (kind_text, rest) = id_part.split_once('[')?;
    let addr_text = rest.strip_suffix(']')?;
    let kind = match kind_text.to_ascii_uppercase().as_str() {
        "PBYTE" => MemoryKind::PhysicalByte,
        "PHWORD" => MemoryKind::PhysicalHalfWord,
        "PWORD" => MemoryKind::PhysicalWord,
        "LBYTE" => MemoryKind::LogicalByte,
        "LHWORD" => MemoryKind::LogicalHalfWord,
        "LWORD" => MemoryKind::LogicalWord,
        "MAP" => MemoryKind::Map,
        _ => return None,
    };
    let addr = parse_numeric(addr_text)?;
    Some((kind, addr))
}

/// Splits `"CP15"` into `("CP", "15")`, `"CPSR"` into `("CPSR", "")`: the
/// leading alphabetic run is the prefix, anything from the first digit
/// onward is the ordinal.
fn split_prefix_ordinal(upper: &str) -> (&str, &str) {
    let split_at = upper.find(|c: char| c.is_ascii_digit()).unwrap_or(upper.len());
    upper.split_at(split_at)
}

fn parse_ordinal(token: &str, ordinal_text: &str) -> Result<u8, ConstraintError> {
    ordinal_text.parse().map_err(|_| syntax(token, "expected a numeric register ordinal"))
}

fn parse_status_value(token: &str, text: &str) -> Result<u32, ConstraintError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() != 4 {
        return Err(syntax(token, "Status needs exactly four flag letters, N Z C V in order"));
    }
    let expected = ['n', 'z', 'c', 'v'];
    let mut mask = 0u32;
    for (i, ch) in chars.iter().enumerate() {
        if ch.to_ascii_lowercase() != expected[i] {
            return Err(syntax(token, "Status flag letters must be N, Z, C, V in that order"));
        }
        if ch.is_ascii_uppercase() {
            mask |= 1 << i;
        }
    }
    Ok(mask)
}

fn parse_token(token: &str, current_coproc: &mut Option<u8>) -> Result<Option<Constraint>, ConstraintError> {
    let (id_part, value_part) = match token.split_once('=') {
        Some((id, value)) => (id.trim(), Some(value.trim())),
        None => (token.trim(), None),
    };
    if id_part.is_empty() {
        return Err(syntax(token, "missing element identifier"));
    }

    if let Some((kind, addr)) = parse_memory_id(id_part) {
        let value_text = value_part.ok_or_else(|| syntax(token, "memory constraint requires a value"))?;
        let value = parse_numeric(value_text).ok_or_else(|| syntax(token, "expected a numeric value"))?;
        return Ok(Some(Constraint {
            location: Location::Memory { kind, addr },
            value,
        }));
    }

    let upper = id_part.to_ascii_uppercase();
    let (prefix, ordinal_text) = split_prefix_ordinal(&upper);

    match prefix {
        "R" if !ordinal_text.is_empty() => {
            let n = parse_ordinal(token, ordinal_text)?;
            if n > 15 {
                return Err(syntax(token, "register ordinal out of range R0-R15"));
            }
            let value = required_scalar(token, value_part)?;
            Ok(Some(Constraint {
                location: Location::CoreRegister(n),
                value,
            }))
        }
        "A" if !ordinal_text.is_empty() => {
            let n = parse_ordinal(token, ordinal_text)?;
            if !(1..=4).contains(&n) {
                return Err(syntax(token, "argument alias out of range A1-A4"));
            }
            let value = required_scalar(token, value_part)?;
            Ok(Some(Constraint {
                location: Location::CoreRegister(n - 1),
                value,
            }))
        }
        "V" if !ordinal_text.is_empty() => {
            let n = parse_ordinal(token, ordinal_text)?;
            if !(1..=6).contains(&n) {
                return Err(syntax(token, "variable alias out of range V1-V6"));
            }
            let value = required_scalar(token, value_part)?;
            Ok(Some(Constraint {
                location: Location::CoreRegister(n + 3),
                value,
            }))
        }
        "CP" | "C" if !ordinal_text.is_empty() => {
            let n = parse_ordinal(token, ordinal_text)?;
            if n > 15 {
                return Err(syntax(token, "coprocessor ordinal out of range CP0-CP15"));
            }
            *current_coproc = Some(n);
            Ok(None)
        }
        "CR" if !ordinal_text.is_empty() => {
            let coproc = current_coproc.ok_or_else(|| ConstraintError::UnboundCoprocRegister(id_part.to_string()))?;
            let reg = parse_ordinal(token, ordinal_text)?;
            if reg > 15 {
                return Err(syntax(token, "coprocessor register ordinal out of range CR0-CR15"));
            }
            let value = required_scalar(token, value_part)?;
            Ok(Some(Constraint {
                location: Location::CoProcRegister { coproc, reg },
                value,
            }))
        }
        "F" if !ordinal_text.is_empty() => {
            let n = parse_ordinal(token, ordinal_text)?;
            if n > 7 {
                return Err(syntax(token, "FPA register ordinal out of range F0-F7"));
            }
            let value = required_scalar(token, value_part)?;
            Ok(Some(Constraint {
                location: Location::FpaRegister(n),
                value,
            }))
        }
        _ => parse_system_register(token, &upper, value_part),
    }
}

fn required_scalar(token: &str, value_part: Option<&str>) -> Result<u32, ConstraintError> {
    let text = value_part.ok_or_else(|| syntax(token, "expected '=value'"))?;
    parse_numeric(text).ok_or_else(|| syntax(token, "expected a numeric value"))
}

fn parse_system_register(token: &str, upper: &str, value_part: Option<&str>) -> Result<Option<Constraint>, ConstraintError> {
    let register = match upper {
        "PC" => SystemRegister::Pc,
        "CPSR" => SystemRegister::Cpsr,
        "SPSR" => SystemRegister::Spsr,
        "MODE" => SystemRegister::Mode,
        "IRQSTATUS" => SystemRegister::IrqStatus,
        "IRQMASK" => SystemRegister::IrqMask,
        "STATUS" => SystemRegister::Status,
        other => return Err(syntax(token, format!("unknown element identifier '{other}'"))),
    };

    let value = match register {
        SystemRegister::Mode => {
            let text = value_part.ok_or_else(|| syntax(token, "a processor mode must be given as a symbol"))?;
            let mode = mode_by_name(text).ok_or_else(|| syntax(token, format!("unknown processor mode '{text}'")))?;
            crate::constraint::mode_code(mode)
        }
        SystemRegister::Status => {
            let text = value_part.ok_or_else(|| syntax(token, "Status requires four flag letters"))?;
            parse_status_value(token, text)?
        }
        _ => required_scalar(token, value_part)?,
    };

    Ok(Some(Constraint {
        location: Location::SystemRegister(register),
        value,
    }))
}

fn check_duplicates(constraints: &[Constraint]) -> Result<(), ConstraintError> {
    for (i, a) in constraints.iter().enumerate() {
        for b in &constraints[i + 1..] {
            if a.location == b.location {
                return Err(ConstraintError::Duplicate(format!("{:?}", a.location)));
            }
        }
    }
    Ok(())
}

/// Parses a full constraint string, e.g. `"R0=1, R1=0x10, CP15, CR0=0x41560300"`.
pub fn parse_constraints(text: &str) -> Result<ConstraintCollection, ConstraintError> {
    let mut constraints = Vec::new();
    let mut current_coproc = None;

    for token in split_tokens(text) {
        if let Some(constraint) = parse_token(token, &mut current_coproc)? {
            constraints.push(constraint);
        }
    }
    check_duplicates(&constraints)?;
    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_registers_and_aliases() {
        let constraints = parse_constraints("R0=1, A2=5, V1=0x10").unwrap();
        assert_eq!(constraints[0], Constraint { location: Location::CoreRegister(0), value: 1 });
        assert_eq!(constraints[1], Constraint { location: Location::CoreRegister(1), value: 5 });
        assert_eq!(constraints[2], Constraint { location: Location::CoreRegister(4), value: 0x10 });
    }

    #[test]
    fn coproc_register_inherits_the_preceding_coprocessor() {
        let constraints = parse_constraints("CP15, CR0=0x41560300").unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(
            constraints[0],
            Constraint {
                location: Location::CoProcRegister { coproc: 15, reg: 0 },
                value: 0x4156_0300,
            }
        );
    }

    #[test]
    fn coproc_register_without_a_coprocessor_is_an_error() {
        assert!(matches!(parse_constraints("CR0=1"), Err(ConstraintError::UnboundCoprocRegister(_))));
    }

    #[test]
    fn parses_mode_symbol_and_status_flags() {
        let constraints = parse_constraints("Mode=Svc32, Status=NzCv").unwrap();
        assert_eq!(constraints[0].location, Location::SystemRegister(SystemRegister::Mode));
        assert_eq!(constraints[1].location, Location::SystemRegister(SystemRegister::Status));
        assert_eq!(constraints[1].value, 0b0101);
    }

    #[test]
    fn parses_memory_constraints_with_bracket_addresses() {
        let constraints = parse_constraints("PWORD[0x8000]=0xDEADBEEF, Map[0x1000]=1").unwrap();
        assert_eq!(
            constraints[0].location,
            Location::Memory {
                kind: MemoryKind::PhysicalWord,
                addr: 0x8000
            }
        );
        assert_eq!(constraints[1].value, 1);
    }

    #[test]
    fn duplicate_locations_are_rejected() {
        assert!(matches!(parse_constraints("R0=1, R0=2"), Err(ConstraintError::Duplicate(_))));
    }

    #[test]
    fn accepts_ampersand_hex_and_binary_literals() {
        let constraints = parse_constraints("R0=&FF, R1=0b101").unwrap();
        assert_eq!(constraints[0].value, 0xFF);
        assert_eq!(constraints[1].value, 0b101);
    }
}
