//! Error types. Architectural exceptions are not modeled here: they are
//! events the exception engine handles, not `Result` failures.

use thiserror::Error;

use crate::options::{ProcessorModel, SystemModel};

/// Raised by [`crate::options::EmuOptions::validate`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{ram_size_kb} KiB is not a valid RAM size for {model:?}")]
    UnsupportedRamSize { model: SystemModel, ram_size_kb: u32 },

    #[error("{processor:?} is not a valid processor for {model:?}")]
    IncompatibleProcessor {
        model: SystemModel,
        processor: ProcessorModel,
    },
}

/// An internal invariant violation: an unreachable decoder branch, a region
/// with no callback bound, or similar. These are bugs, not runtime
/// conditions, and the caller is expected to abort rather than try to
/// recover.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal invariant violation: {0}")]
    Invariant(String),
}
