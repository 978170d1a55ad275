//! The address map and region types (C1, C2).

pub mod map;
pub mod region;

pub use map::{AccessResult, AddressMap, AddressSpace, UnmappedPolicy};
pub use region::{HostBlock, MmioDevice, Region, SystemContext};
