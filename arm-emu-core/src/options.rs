//! System configuration: `SystemModel`, `ProcessorModel`, and the RAM-size
//! validation rules each hardware model imposes.
//!
//! Grounded on `original_source/Include/ArmEmu/EmuOptions.hpp`'s `Options`
//! class: the same `SystemModel`/`ProcessorModel` enumerations and
//! `isValidMemcRAMSize`/`isValidRiscPCRAMSize` validators, scoped down to
//! the fields that affect this crate's core (display/hard disk/joystick/
//! ROM-preset fields belong to a fuller system skeleton and are out of
//! scope here).

use crate::error::ConfigError;

/// The base hardware platform: selects the memory map skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemModel {
    /// A minimal test harness: processor, 32 KiB ROM, 32 KiB RAM, no MMU.
    TestBed,
    /// The original Archimedes hardware (ARM2/ARM3, MEMC memory controller).
    Archimedies,
    /// The A-Series hardware (ARM250/ARM3, MEMC memory controller).
    ASeries,
    /// The RiscPC hardware (ARMv3/ARMv4, IOMD memory controller).
    RiscPC,
}

/// The processor core variant: selects decoder feature set and coprocessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorModel {
    Arm2,
    Arm250,
    Arm3,
    Arm3Fpa,
    Arm610,
    Arm710,
    Arm710Fpa,
    Arm810,
    Arm810Fpa,
    StrongArm,
    StrongArmFpa,
}

impl ProcessorModel {
    /// Whether this variant has an FPA coprocessor bound at slots 1/2.
    pub fn has_fpa(self) -> bool {
        matches!(
            self,
            ProcessorModel::Arm3Fpa | ProcessorModel::Arm710Fpa | ProcessorModel::Arm810Fpa | ProcessorModel::StrongArmFpa
        )
    }

    /// Whether this variant has CP15 (system control coprocessor) bound at
    /// slot 15. ARM2 predates CP15 entirely.
    pub fn has_cp15(self) -> bool {
        !matches!(self, ProcessorModel::Arm2)
    }

    /// Whether this variant runs in 26-bit addressing mode. ARM610 onward
    /// (the ARMv3/ARMv4 cores) run 32-bit; ARM2/ARM250/ARM3 are 26-bit only.
    pub fn is_26bit_only(self) -> bool {
        matches!(self, ProcessorModel::Arm2 | ProcessorModel::Arm250 | ProcessorModel::Arm3 | ProcessorModel::Arm3Fpa)
    }
}

/// The MEMC memory controller (TestBed/Archimedes/A-Series) only accepts a
/// fixed set of power-of-two RAM sizes.
const MEMC_RAM_SIZES_KB: &[u32] = &[512, 1024, 2048, 4096, 8192, 16384];

/// The IOMD memory controller (RiscPC) supports a larger range.
const RISCPC_RAM_SIZES_KB: &[u32] = &[4096, 8192, 16384, 32768, 65536];

fn is_valid_memc_ram_size(size_kb: u32) -> bool {
    MEMC_RAM_SIZES_KB.contains(&size_kb)
}

fn is_valid_riscpc_ram_size(size_kb: u32) -> bool {
    RISCPC_RAM_SIZES_KB.contains(&size_kb)
}

/// The subset of `original_source`'s `Options` that affects the core: model,
/// processor, clock speed (informational), and RAM size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmuOptions {
    pub model: SystemModel,
    pub processor: ProcessorModel,
    pub processor_speed_mhz: u16,
    pub ram_size_kb: u32,
}

impl EmuOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ram_ok = match self.model {
            SystemModel::TestBed | SystemModel::Archimedies | SystemModel::ASeries => is_valid_memc_ram_size(self.ram_size_kb),
            SystemModel::RiscPC => is_valid_riscpc_ram_size(self.ram_size_kb),
        };
        if !ram_ok {
            return Err(ConfigError::UnsupportedRamSize {
                model: self.model,
                ram_size_kb: self.ram_size_kb,
            });
        }

        let processor_ok = match self.model {
            SystemModel::TestBed | SystemModel::Archimedies => !matches!(
                self.processor,
                ProcessorModel::Arm610 | ProcessorModel::Arm710 | ProcessorModel::Arm710Fpa | ProcessorModel::Arm810 | ProcessorModel::Arm810Fpa | ProcessorModel::StrongArm | ProcessorModel::StrongArmFpa
            ),
            SystemModel::ASeries => matches!(self.processor, ProcessorModel::Arm250 | ProcessorModel::Arm3 | ProcessorModel::Arm3Fpa),
            SystemModel::RiscPC => !self.processor.is_26bit_only(),
        };
        if !processor_ok {
            return Err(ConfigError::IncompatibleProcessor {
                model: self.model,
                processor: self.processor,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testbed_accepts_memc_sizes() {
        let options = EmuOptions {
            model: SystemModel::TestBed,
            processor: ProcessorModel::Arm2,
            processor_speed_mhz: 8,
            ram_size_kb: 4096,
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn testbed_rejects_non_memc_size() {
        let options = EmuOptions {
            model: SystemModel::TestBed,
            processor: ProcessorModel::Arm2,
            processor_speed_mhz: 8,
            ram_size_kb: 3000,
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn riscpc_rejects_26bit_only_processor() {
        let options = EmuOptions {
            model: SystemModel::RiscPC,
            processor: ProcessorModel::Arm2,
            processor_speed_mhz: 30,
            ram_size_kb: 8192,
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn riscpc_accepts_strongarm() {
        let options = EmuOptions {
            model: SystemModel::RiscPC,
            processor: ProcessorModel::StrongArm,
            processor_speed_mhz: 200,
            ram_size_kb: 16384,
        };
        assert!(options.validate().is_ok());
    }
}
