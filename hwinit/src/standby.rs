// Standby NMI handling
//
// The PMU signals wake-up through the NMI line. It is enabled on the way
// into standby and disabled again on the way out.

use log::info;

use crate::gic::{InterruptController, GIC_SRC_NMI};
use crate::Result;

/// Prepare the interrupt controller for standby.
pub fn standby_store<C: InterruptController + ?Sized>(gic: &mut C) -> Result<()> {
    gic.enable_interrupt(GIC_SRC_NMI)?;
    info!("standby: nmi enabled");
    Ok(())
}

/// Undo [`standby_store`] after wake-up.
pub fn standby_restore<C: InterruptController + ?Sized>(gic: &mut C) -> Result<()> {
    gic.disable_interrupt(GIC_SRC_NMI)?;
    info!("standby: nmi disabled");
    Ok(())
}
