//! CPU interrupt masking
//!
//! Sets or clears the I and F bits of CPSR. Only 32-bit ARM has them; on
//! any other target (host tests included) these are no-ops.

/// Mask IRQ and FIQ on this core.
#[inline]
pub fn mask_irqs() {
    #[cfg(target_arch = "arm")]
    // SAFETY: only changes the CPSR interrupt mask bits
    unsafe {
        core::arch::asm!("cpsid if", options(nostack, preserves_flags));
    };
}

/// Unmask IRQ and FIQ on this core.
#[inline]
pub fn unmask_irqs() {
    #[cfg(target_arch = "arm")]
    // SAFETY: only changes the CPSR interrupt mask bits
    unsafe {
        core::arch::asm!("cpsie if", options(nostack, preserves_flags));
    };
}

/// Run `f` with IRQ and FIQ masked, unmasking afterwards.
pub fn with_irqs_masked<T>(f: impl FnOnce() -> T) -> T {
    mask_irqs();
    let ret = f();
    unmask_irqs();
    ret
}
