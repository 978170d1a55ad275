//! The benchmark's seven named configurations, each selecting a processor
//! variant to run the TestBed system under.
//!
//! Grounded on `original_source/ArmEmu/EmuPerfTest_Main.cpp`'s `Configuration`
//! enum and `getConfigMetadata()`: same seven names, same processor mapping.

use arm_emu_core::options::ProcessorModel;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Configuration {
    #[value(name = "ARMv2-Test")]
    ArmV2Test,
    #[value(name = "ARMv2a-Test")]
    ArmV2aTest,
    #[value(name = "ARMv2a-FPA-Test")]
    ArmV2aFpaTest,
    #[value(name = "ARMv3-Test")]
    ArmV3Test,
    #[value(name = "ARMv3-FPA-Test")]
    ArmV3FpaTest,
    #[value(name = "ARMv4-Test")]
    ArmV4Test,
    #[value(name = "ARMv4-FPA-Test")]
    ArmV4FpaTest,
}

impl Configuration {
    pub fn processor(self) -> ProcessorModel {
        match self {
            Configuration::ArmV2Test => ProcessorModel::Arm2,
            Configuration::ArmV2aTest => ProcessorModel::Arm3,
            Configuration::ArmV2aFpaTest => ProcessorModel::Arm3Fpa,
            Configuration::ArmV3Test => ProcessorModel::Arm610,
            Configuration::ArmV3FpaTest => ProcessorModel::Arm710Fpa,
            Configuration::ArmV4Test => ProcessorModel::Arm810,
            Configuration::ArmV4FpaTest => ProcessorModel::Arm810Fpa,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Configuration::ArmV2Test => "ARMv2-Test",
            Configuration::ArmV2aTest => "ARMv2a-Test",
            Configuration::ArmV2aFpaTest => "ARMv2a-FPA-Test",
            Configuration::ArmV3Test => "ARMv3-Test",
            Configuration::ArmV3FpaTest => "ARMv3-FPA-Test",
            Configuration::ArmV4Test => "ARMv4-Test",
            Configuration::ArmV4FpaTest => "ARMv4-FPA-Test",
        }
    }

    pub const ALL: &'static [Configuration] = &[
        Configuration::ArmV2Test,
        Configuration::ArmV2aTest,
        Configuration::ArmV2aFpaTest,
        Configuration::ArmV3Test,
        Configuration::ArmV3FpaTest,
        Configuration::ArmV4Test,
        Configuration::ArmV4FpaTest,
    ];
}
