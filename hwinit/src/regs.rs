//! Register access
//!
//! Offsets are in bytes from the start of the block; every register is a
//! 32-bit word.

/// A block of 32-bit device registers.
pub trait RegisterBlock {
    fn read32(&self, offset: usize) -> u32;
    fn write32(&mut self, offset: usize, value: u32);
}

/// Memory-mapped registers, accessed with volatile loads and stores.
pub struct MmioRegisters {
    base: usize,
}

impl MmioRegisters {
    /// # Safety
    /// `base` must be the mapped address of a device register block that
    /// stays mapped for the lifetime of this value.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for MmioRegisters {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: base is a live register block (see `new`)
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write32(&mut self, offset: usize, value: u32) {
        // SAFETY: as above
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}
