//! Interrupt Controller Layer
//!
//! The small slice of interrupt hardware the boot stage touches before it
//! hands over: the GIC distributor and CPU interface, the CPU's own IRQ/FIQ
//! mask, and the NMI line used across standby.
//!
//! # Layout
//!
//! ```text
//! regs     RegisterBlock trait, volatile MMIO backend
//! gic      InterruptController trait, GIC-400 implementation
//! cpu      CPSR I/F masking (32-bit ARM only)
//! standby  NMI enable/disable around standby
//! ```
//!
//! Register access goes through [`regs::RegisterBlock`], so everything above
//! it runs against an in-memory register file on the host.

#![cfg_attr(not(test), no_std)]

use core::fmt;

pub mod cpu;
pub mod gic;
pub mod regs;
pub mod standby;

pub use gic::{Gic, InterruptController, GIC_IRQ_NUM, GIC_SRC_NMI};
pub use regs::{MmioRegisters, RegisterBlock};

/// Result type for HAL operations
pub type Result<T> = core::result::Result<T, HalError>;

/// HAL errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Interrupt id beyond what the controller implements
    InvalidIrq(u32),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIrq(id) => write!(f, "irq {} out of range (max {})", id, GIC_IRQ_NUM - 1),
        }
    }
}
