//! Generic Interrupt Controller (GIC-400) - distributor and CPU interface
//!
//! # Registers used
//!
//! ```text
//! Distributor (GICD)            CPU interface (GICC)
//!   0x100 + 4n  ISENABLER n       0x00C   IAR
//!   0x180 + 4n  ICENABLER n       0x010   EOIR
//!   0x280 + 4n  ICPENDR n         0x1000  DIR
//! ```
//!
//! The enable/pending registers are write-1-to-act: writing a single bit
//! touches only that interrupt, so no read-modify-write is needed.

use log::warn;

use crate::regs::{MmioRegisters, RegisterBlock};
use crate::{HalError, Result};

// ═══════════════════════════════════════════════════════════════════════════
// PLATFORM CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════

/// Interrupt ids implemented by the controller.
pub const GIC_IRQ_NUM: u32 = 160;
/// NMI line from the PMU.
pub const GIC_SRC_NMI: u32 = 32;

/// Distributor base on sun7i.
pub const GIC_DIST_BASE: usize = 0x01c8_1000;
/// CPU interface base on sun7i.
pub const GIC_CPUIF_BASE: usize = 0x01c8_2000;

// ═══════════════════════════════════════════════════════════════════════════
// REGISTER OFFSETS
// ═══════════════════════════════════════════════════════════════════════════

const GICD_ISENABLER: usize = 0x100;
const GICD_ICENABLER: usize = 0x180;
const GICD_ICPENDR: usize = 0x280;

const GICC_IAR: usize = 0x00C;
const GICC_EOIR: usize = 0x010;
const GICC_DIR: usize = 0x1000;

const INTID_MASK: u32 = 0x3ff;
/// Ids 1020..=1023 are special (1023: nothing pending).
const FIRST_SPECIAL_INTID: u32 = 1020;

#[inline]
fn bank(base: usize, irq: u32) -> usize {
    base + 4 * (irq >> 5) as usize
}

#[inline]
fn bit(irq: u32) -> u32 {
    1 << (irq & 0x1f)
}

/// Per-line interrupt control.
pub trait InterruptController {
    fn enable_interrupt(&mut self, irq: u32) -> Result<()>;
    fn disable_interrupt(&mut self, irq: u32) -> Result<()>;

    /// Acknowledge the highest-priority pending interrupt and complete it.
    /// Returns its id (a special id >= 1020 if nothing was pending).
    fn ack_pending(&mut self) -> u32;
}

/// GIC driven through a distributor and a CPU interface register block
pub struct Gic<R: RegisterBlock> {
    dist: R,
    cpu: R,
}

impl Gic<MmioRegisters> {
    /// GIC at the fixed sun7i addresses.
    ///
    /// # Safety
    /// Both register blocks must be mapped at their physical addresses.
    pub unsafe fn sun7i() -> Self {
        Self::new(
            MmioRegisters::new(GIC_DIST_BASE),
            MmioRegisters::new(GIC_CPUIF_BASE),
        )
    }
}

impl<R: RegisterBlock> Gic<R> {
    pub fn new(dist: R, cpu: R) -> Self {
        Self { dist, cpu }
    }

    pub fn distributor(&self) -> &R {
        &self.dist
    }

    pub fn cpu_interface(&self) -> &R {
        &self.cpu
    }

    fn check(irq: u32) -> Result<()> {
        if irq >= GIC_IRQ_NUM {
            warn!("gic: irq {} out of range", irq);
            return Err(HalError::InvalidIrq(irq));
        }
        Ok(())
    }
}

impl<R: RegisterBlock> InterruptController for Gic<R> {
    fn enable_interrupt(&mut self, irq: u32) -> Result<()> {
        Self::check(irq)?;
        self.dist.write32(bank(GICD_ISENABLER, irq), bit(irq));
        Ok(())
    }

    fn disable_interrupt(&mut self, irq: u32) -> Result<()> {
        Self::check(irq)?;
        self.dist.write32(bank(GICD_ICENABLER, irq), bit(irq));
        Ok(())
    }

    fn ack_pending(&mut self) -> u32 {
        let iar = self.cpu.read32(GICC_IAR);
        let irq = iar & INTID_MASK;
        if irq >= FIRST_SPECIAL_INTID {
            return irq;
        }

        self.cpu.write32(GICC_EOIR, iar);
        self.cpu.write32(GICC_DIR, iar);
        if irq < GIC_IRQ_NUM {
            self.dist.write32(bank(GICD_ICPENDR, irq), bit(irq));
        }
        irq
    }
}
