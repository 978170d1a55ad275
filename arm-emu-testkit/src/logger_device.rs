//! A 16-byte MMIO test device: a fixed ID register plus a command register a
//! test harness can inspect afterward.
//!
//! Grounded on `original_source/ArmEmu/Test/LoggerDevice.hpp`/`.cpp`: same
//! size, same ID value at offset 0. The original's command-register write is
//! an empty stub (declared "receives 32-bit command values" but does
//! nothing); this port actually keeps the values so a test can assert on
//! what a program wrote.

use arm_emu_core::{MmioDevice, SystemContext};

/// The fixed value read back from offset 0.
pub const LOGGER_ID: u32 = 0xDEAD_BEEF;
pub const LOGGER_SIZE: u32 = 16;

/// Logs every word written to its command register (offset 0) for later
/// inspection; reads of that offset answer with [`LOGGER_ID`].
#[derive(Debug, Default)]
pub struct LoggerDevice {
    commands: Vec<u32>,
    irq_line: Option<u32>,
}

impl LoggerDevice {
    pub fn new() -> Self {
        LoggerDevice::default()
    }

    /// Every value written to the command register, in write order.
    pub fn commands(&self) -> &[u32] {
        &self.commands
    }

    /// Raises the connected IRQ line, if one is bound, as a way for a test
    /// program to signal completion back to the harness.
    pub fn raise_irq(&mut self, ctx: &mut dyn SystemContext) {
        if let Some(line) = self.irq_line {
            ctx.raise_irq(line);
        }
    }
}

impl MmioDevice for LoggerDevice {
    fn read(&mut self, offset: u32) -> u32 {
        if offset >> 2 == 0 {
            LOGGER_ID
        } else {
            0
        }
    }

    fn write(&mut self, offset: u32, value: u32) {
        if offset >> 2 == 0 {
            self.commands.push(value);
        }
    }

    fn connect(&mut self, _ctx: &mut dyn SystemContext) {
        self.irq_line = Some(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullContext;
    impl SystemContext for NullContext {
        fn raise_irq(&mut self, _line: u32) {}
        fn raise_firq(&mut self, _line: u32) {}
    }

    #[test]
    fn id_register_reads_back_the_fixed_value() {
        let mut device = LoggerDevice::new();
        assert_eq!(device.read(0), LOGGER_ID);
        assert_eq!(device.read(4), 0);
    }

    #[test]
    fn command_writes_are_logged_in_order() {
        let mut device = LoggerDevice::new();
        device.write(0, 1);
        device.write(0, 2);
        device.write(4, 99);
        assert_eq!(device.commands(), &[1, 2]);
    }

    #[test]
    fn connect_binds_an_irq_line() {
        let mut device = LoggerDevice::new();
        let mut ctx = NullContext;
        device.connect(&mut ctx);
        device.raise_irq(&mut ctx);
    }
}
