//! A constraint-based test harness for `arm-emu-core`: a mini-language for
//! describing processor/memory state to apply before a program runs and
//! assert against once it stops, plus a couple of minimal MMIO test devices.
//!
//! Grounded on `original_source/ArmEmu/TestConstraints.hpp`/`.cpp` and
//! `original_source/ArmEmu/Test/LoggerDevice.hpp`/`.cpp`.

pub mod constraint;
pub mod logger_device;
pub mod ops;
pub mod parser;

pub use constraint::{Constraint, ConstraintCollection, Location, MemoryKind, SystemRegister};
pub use logger_device::LoggerDevice;
pub use ops::{assert_final, apply_initial, Mismatch, OpsError};
pub use parser::{parse_constraints, ConstraintError};
