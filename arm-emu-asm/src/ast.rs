//! Parsed statement and operand shapes, one step removed from the bit
//! layouts in `arm_emu_core::decode`. A statement is either a label
//! definition, a data word, or an instruction with its mnemonic already
//! split into (base operation, condition, set-flags) plus source-level
//! operands that still need label addresses resolved before they can be
//! encoded (see `crate::encode`).

use arm_emu_core::condition::Condition;
use arm_emu_core::decode::{AluOp, ShiftKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftAmountSrc {
    Immediate(u8),
    Register(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand2Src {
    Immediate(i64),
    Register {
        reg: u8,
        shift: Option<(ShiftKind, ShiftAmountSrc)>,
        rrx: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetSrc {
    Immediate(i32),
    Register { reg: u8, add: bool, shift: Option<(ShiftKind, u8)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressingSrc {
    PreIndexed { rn: u8, offset: OffsetSrc, writeback: bool },
    PostIndexed { rn: u8, offset: OffsetSrc },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferWidth {
    Word,
    Byte,
    SignedByte,
    HalfWord,
    SignedHalfWord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    DataProcessing {
        op: AluOp,
        set_flags: bool,
        rd: u8,
        rn: u8,
        operand2: Operand2Src,
    },
    Mrs {
        rd: u8,
        use_spsr: bool,
    },
    Msr {
        use_spsr: bool,
        field_mask: u8,
        operand2: Operand2Src,
    },
    Mul {
        accumulate: bool,
        set_flags: bool,
        rd: u8,
        rm: u8,
        rs: u8,
        rn: u8,
    },
    SingleTransfer {
        load: bool,
        width: TransferWidth,
        rd: u8,
        addr: AddressingSrc,
    },
    /// `LDR Rd, =expr`: assembled into a literal-pool entry plus a
    /// PC-relative load, resolved once the pool's final address is known.
    LoadLiteral {
        rd: u8,
        value: i64,
    },
    BlockTransfer {
        load: bool,
        pre_index: bool,
        up: bool,
        writeback: bool,
        user_bank: bool,
        rn: u8,
        register_list: u16,
    },
    Branch {
        link: bool,
        target: String,
    },
    BranchExchange {
        rm: u8,
    },
    SoftwareInterrupt {
        comment: u32,
    },
    Breakpoint {
        comment: u16,
    },
    Swap {
        byte: bool,
        rn: u8,
        rd: u8,
        rm: u8,
    },
    Cdp {
        coproc: u8,
        opcode: u8,
        crn: u8,
        crd: u8,
        crm: u8,
        op2: u8,
    },
    Mrc {
        coproc: u8,
        opcode: u8,
        crn: u8,
        rd: u8,
        crm: u8,
        op2: u8,
    },
    Mcr {
        coproc: u8,
        opcode: u8,
        crn: u8,
        rd: u8,
        crm: u8,
        op2: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Label(String),
    Word(i64),
    Instruction { condition: Condition, insn: Insn },
}

/// Resolves a register mnemonic, including the argument/variable aliases
/// plus the standard ARM aliases (`A1..A4` = R0..R3, `V1..V6` = R4..R9).
pub fn parse_register(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "PC" => return Some(15),
        "LR" => return Some(14),
        "SP" => return Some(13),
        _ => {}
    }
    if let Some(rest) = upper.strip_prefix('R') {
        if let Ok(n) = rest.parse::<u8>() {
            if n <= 15 {
                return Some(n);
            }
        }
    }
    if let Some(rest) = upper.strip_prefix('A') {
        if let Ok(n) = rest.parse::<u8>() {
            if (1..=4).contains(&n) {
                return Some(n - 1);
            }
        }
    }
    if let Some(rest) = upper.strip_prefix('V') {
        if let Ok(n) = rest.parse::<u8>() {
            if (1..=6).contains(&n) {
                return Some(n + 3);
            }
        }
    }
    None
}
