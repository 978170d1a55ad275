//! Assembly errors: surfaced as a message, the caller's test fails, and the
//! core is never entered.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("undefined label '{0}'")]
    UndefinedLabel(String),

    #[error("label '{0}' defined more than once")]
    DuplicateLabel(String),

    #[error("branch offset to '{label}' does not fit in 24 bits")]
    BranchOutOfRange { label: String },
}
