//! Constraint types: one element of processor or memory state plus a value
//! to apply before a test program runs or assert against once it stops.
//!
//! Grounded on `original_source/ArmEmu/TestConstraints.hpp`'s `SystemElement`/
//! `SystemRegister`/`Constraint`. `Location::Memory` and
//! `SystemRegister::Status` have no counterpart there: the original's
//! `SystemElement` enum never names a memory location, and it constrains the
//! flags only by setting the whole CPSR/SPSR word. Both are this crate's own
//! extension.

use arm_emu_core::psr::ProcessorMode;

/// Which register or memory location a constraint names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// R0-R15, already resolved from any `A`/`V` alias.
    CoreRegister(u8),
    /// A coprocessor's internal register, addressed as `crn` with the rest
    /// of the MRC/MCR addressing tuple (opcode/crm/op2) left at zero: the
    /// common case for the small set of registers these test fixtures name.
    CoProcRegister { coproc: u8, reg: u8 },
    /// One of the FPA's eight data registers.
    FpaRegister(u8),
    SystemRegister(SystemRegister),
    /// Not in the original: a physical- or logical-bus memory peek/poke.
    Memory { kind: MemoryKind, addr: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemRegister {
    Pc,
    Cpsr,
    Spsr,
    /// Symbolic processor mode, applied/asserted via [`mode_code`]/
    /// [`mode_from_code`] rather than the raw 26-bit or 32-bit mode field
    /// (the two disagree on bit layout, and a constraint author shouldn't
    /// have to know which one the target core happens to use).
    Mode,
    IrqStatus,
    IrqMask,
    /// Shorthand for all four condition flags at once: N/Z/C/V packed into
    /// bits 0-3 of the constraint value (1 = set). Not in the original,
    /// which only ever constrains the whole CPSR/SPSR word.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    PhysicalByte,
    PhysicalHalfWord,
    PhysicalWord,
    LogicalByte,
    LogicalHalfWord,
    LogicalWord,
    /// Probes only whether an address is mapped, ignoring its contents.
    Map,
}

/// One parsed constraint: a location plus the value to apply or assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub location: Location,
    pub value: u32,
}

pub type ConstraintCollection = Vec<Constraint>;

/// The symbolic names a `Mode` constraint accepts, matched case-insensitively.
pub const PROCESSOR_MODE_NAMES: &[(&str, ProcessorMode)] = &[
    ("User26", ProcessorMode::User26),
    ("Firq26", ProcessorMode::Firq26),
    ("Irq26", ProcessorMode::Irq26),
    ("Svc26", ProcessorMode::Svc26),
    ("User32", ProcessorMode::User32),
    ("Firq32", ProcessorMode::Firq32),
    ("Irq32", ProcessorMode::Irq32),
    ("Svc32", ProcessorMode::Svc32),
    ("Abort32", ProcessorMode::Abort32),
    ("Undefined32", ProcessorMode::Undefined32),
];

/// Looks up a mode by name, case-insensitively.
pub fn mode_by_name(name: &str) -> Option<ProcessorMode> {
    PROCESSOR_MODE_NAMES
        .iter()
        .find(|(symbol, _)| symbol.eq_ignore_ascii_case(name))
        .map(|(_, mode)| *mode)
}

/// The index of a mode in [`PROCESSOR_MODE_NAMES`], used as the constraint's
/// `value` so `Location::SystemRegister(SystemRegister::Mode)` carries a
/// plain integer like every other constraint.
pub fn mode_code(mode: ProcessorMode) -> u32 {
    PROCESSOR_MODE_NAMES.iter().position(|(_, m)| *m == mode).expect("every ProcessorMode is listed") as u32
}

pub fn mode_from_code(code: u32) -> Option<ProcessorMode> {
    PROCESSOR_MODE_NAMES.get(code as usize).map(|(_, mode)| *mode)
}

pub fn mode_name(mode: ProcessorMode) -> &'static str {
    PROCESSOR_MODE_NAMES.iter().find(|(_, m)| *m == mode).map(|(name, _)| *name).expect("every ProcessorMode is listed")
}
