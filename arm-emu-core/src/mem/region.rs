//! Memory region variants (C2): host block, MMIO device, open bus.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::word::Word;

/// Handle devices use to raise interrupts and learn the current IRQ/FIQ
/// mask, handed to a region's [`MmioDevice::connect`] at bind time.
pub trait SystemContext {
    fn raise_irq(&mut self, line: u32);
    fn raise_firq(&mut self, line: u32);
}

/// A memory-mapped device. Offsets are always relative to the region's own
/// base, regardless of where the region is mapped in the address space.
pub trait MmioDevice {
    fn read(&mut self, offset: u32) -> u32;
    fn write(&mut self, offset: u32, value: u32);

    /// Atomic read-modify-write for the SWP/SWPB instruction. The default
    /// implementation is non-atomic (fine for every device in this crate,
    /// which is single-threaded); override for a device that needs true
    /// atomicity semantics.
    fn exchange(&mut self, offset: u32, write_value: u32) -> u32 {
        let previous = self.read(offset);
        self.write(offset, write_value);
        previous
    }

    /// Invoked once when the region is bound into an address map, giving the
    /// device a handle to the interrupt bus. Devices with no interrupt line
    /// can ignore this.
    fn connect(&mut self, _ctx: &mut dyn SystemContext) {}
}

/// One entry in the address map.
pub enum Region {
    /// Fixed-size contiguous byte buffer owned by the region.
    HostBlock(HostBlock),
    /// A memory-mapped device occupying `size` bytes of address space.
    Mmio(Box<dyn MmioDevice>, u32),
}

/// A plain byte buffer backing ROM or RAM. The backing bytes live behind an
/// `Rc<RefCell<_>>` rather than being owned outright, so the same RAM can be
/// bound into both a read map and a write map as two `HostBlock` values
/// that observe each other's writes (see [`HostBlock::ram_pair`]) — plain
/// ownership can't give two separately-inserted regions a shared view of
/// the same bytes.
pub struct HostBlock {
    data: Rc<RefCell<Vec<u8>>>,
    writable: bool,
}

impl HostBlock {
    /// RAM with no other map sharing its backing bytes. Fine for a region
    /// only ever reachable through one of read_map/write_map (most MMIO-like
    /// host blocks); use [`HostBlock::ram_pair`] for RAM a running program
    /// both fetches/loads from and stores into.
    pub fn ram(size: usize) -> Self {
        HostBlock {
            data: Rc::new(RefCell::new(vec![0u8; size])),
            writable: true,
        }
    }

    /// Two `HostBlock`s sharing one backing buffer, for inserting the same
    /// RAM at the same base into both a read map and a write map.
    pub fn ram_pair(size: usize) -> (Self, Self) {
        let data = Rc::new(RefCell::new(vec![0u8; size]));
        (
            HostBlock {
                data: data.clone(),
                writable: true,
            },
            HostBlock { data, writable: true },
        )
    }

    pub fn rom(image: Vec<u8>) -> Self {
        HostBlock {
            data: Rc::new(RefCell::new(image)),
            writable: false,
        }
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Raw bytes, for bulk DMA-style transfers from the tooling layer.
    pub fn as_slice(&self) -> Ref<'_, [u8]> {
        Ref::map(self.data.borrow(), |v| v.as_slice())
    }

    pub fn as_mut_slice(&self) -> RefMut<'_, [u8]> {
        RefMut::map(self.data.borrow_mut(), |v| v.as_mut_slice())
    }

    fn read32(&self, offset: u32) -> u32 {
        let data = self.data.borrow();
        let offset = offset as usize & !3;
        if offset + 4 > data.len() {
            return u32::MAX;
        }
        u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    fn write32(&self, offset: u32, value: u32) {
        if !self.writable {
            return;
        }
        let mut data = self.data.borrow_mut();
        let offset = offset as usize & !3;
        if offset + 4 > data.len() {
            return;
        }
        data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Region {
    pub fn size(&self) -> usize {
        match self {
            Region::HostBlock(block) => block.len(),
            Region::Mmio(_, size) => *size as usize,
        }
    }

    pub fn read(&mut self, offset: u32) -> Word {
        match self {
            Region::HostBlock(block) => block.read32(offset),
            Region::Mmio(device, _) => device.read(offset),
        }
    }

    pub fn write(&mut self, offset: u32, value: Word) {
        match self {
            Region::HostBlock(block) => block.write32(offset, value),
            Region::Mmio(device, _) => device.write(offset, value),
        }
    }

    pub fn exchange(&mut self, offset: u32, write_value: Word) -> Word {
        match self {
            Region::HostBlock(block) => {
                let previous = block.read32(offset);
                block.write32(offset, write_value);
                previous
            }
            Region::Mmio(device, _) => device.exchange(offset, write_value),
        }
    }

    pub fn connect(&mut self, ctx: &mut dyn SystemContext) {
        if let Region::Mmio(device, _) = self {
            device.connect(ctx);
        }
    }
}
