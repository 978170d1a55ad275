//! Builds the TestBed memory map: 32 KiB ROM at 0 (mirrored at a high
//! address), 32 KiB RAM at 0x8000, no MMU.
//!
//! Grounded on `original_source/ArmEmu/EmuPerfTest_Main.cpp`'s
//! `initialiseEmbeddedTestSystem`: same ROM/RAM sizing and bases, the same
//! breakpoint-filled ROM with a reset-vector branch into RAM, and the same
//! full-descending-stack setup in R13. The original's high-ROM mirror base
//! comes from a `TestBedHardware.inl` this pack does not retrieve; this port
//! mirrors ROM at 0x0300_0000, a value chosen only to be clearly outside the
//! RAM range, and documents that as a placeholder rather than a traced
//! constant.

use anyhow::{bail, Result};
use arm_emu_asm::encode;
use arm_emu_core::condition::Condition;
use arm_emu_core::mem::map::UnmappedPolicy;
use arm_emu_core::mem::region::HostBlock;
use arm_emu_core::mem::{AddressMap, Region};
use arm_emu_core::{bind_coprocessors, Core};

use crate::configuration::Configuration;

pub const ROM_BASE: u32 = 0x0000_0000;
pub const ROM_SIZE: u32 = 0x8000;
pub const ROM_MIRROR_BASE: u32 = 0x0300_0000;
pub const RAM_BASE: u32 = 0x8000;
pub const RAM_SIZE: u32 = 0x8000;

use arm_emu_asm::ast::Insn;

fn breakpoint_rom() -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(ROM_SIZE as usize);
    let word_count = ROM_SIZE / 4;
    for index in 0..word_count {
        let insn = Insn::Breakpoint { comment: index as u16 };
        let word = encode::encode(Condition::Always, &insn, 0, ROM_BASE + index * 4)?;
        bytes.extend_from_slice(&word.to_le_bytes());
    }

    // Reset vector: a branch from ROM_BASE to RAM_BASE, replacing word 0.
    let branch = Insn::Branch {
        link: false,
        target: String::new(),
    };
    let raw = encode::encode(Condition::Always, &branch, 0, ROM_BASE)?;
    let fetch_pc = ROM_BASE + 8;
    let patched = encode::patch_branch_offset(raw, RAM_BASE as i32 - fetch_pc as i32, "reset")?;
    bytes[0..4].copy_from_slice(&patched.to_le_bytes());

    Ok(bytes)
}

/// A constructed TestBed system, ready for `core.run(cycle_budget)`.
pub struct TestBed {
    pub core: Core,
}

/// Builds a TestBed system for `config`, loads `program` at the start of
/// RAM, seeds R0 with `cycle_count`, and sets up a full-descending stack.
pub fn build(config: Configuration, program: &[u32], cycle_count: u32) -> Result<TestBed> {
    let processor = config.processor();
    let rom_image = breakpoint_rom()?;

    let mut read_map = AddressMap::new(UnmappedPolicy::default());
    let mut write_map = AddressMap::new(UnmappedPolicy::default());

    if !read_map.try_insert(ROM_BASE, Region::HostBlock(HostBlock::rom(rom_image.clone()))) {
        bail!("could not map ROM at 0x{ROM_BASE:08X}");
    }
    if !read_map.try_insert(ROM_MIRROR_BASE, Region::HostBlock(HostBlock::rom(rom_image))) {
        bail!("could not map mirrored ROM at 0x{ROM_MIRROR_BASE:08X}");
    }
    let (ram_read, ram_write) = HostBlock::ram_pair(RAM_SIZE as usize);
    if !read_map.try_insert(RAM_BASE, Region::HostBlock(ram_read)) {
        bail!("could not map RAM at 0x{RAM_BASE:08X}");
    }
    if !write_map.try_insert(RAM_BASE, Region::HostBlock(ram_write)) {
        bail!("could not map writable RAM at 0x{RAM_BASE:08X}");
    }

    let coprocessors = bind_coprocessors(processor);
    let mode_26bit = processor.is_26bit_only();
    let mut core = Core::new(read_map, write_map, coprocessors, mode_26bit);

    for (index, word) in program.iter().enumerate() {
        core.write_map.write_typed(RAM_BASE + index as u32 * 4, *word);
    }

    core.registers.set(0, cycle_count);
    core.registers.set(13, RAM_BASE + RAM_SIZE - 4);

    Ok(TestBed { core })
}
