//! Build-time boot configuration
//!
//! Everything the pipeline needs that is fixed per board: load addresses,
//! image names, machine type and the de-init barrier bound. Runtime key
//! ranges come from the script store instead (see [`crate::platform::ScriptConfig`]).

use crate::boot::loader::BootImageSet;

/// Load address of the single-image boot (u-boot.bin).
pub const DEFAULT_KERNEL_ADDR: u32 = 0x4a00_0000;
/// Image staged by the single-image boot.
pub const DEFAULT_KERNEL_IMAGE: &str = "c:\\linux\\u-boot.bin";
/// Size budget for the single-image boot.
pub const DEFAULT_KERNEL_MAX_SIZE: u32 = 2 * 1024 * 1024;
/// Parameter block handed over when no parameter image is loaded.
pub const DEFAULT_PARAM_ADDR: u32 = 0x4000_0100;
/// ARM machine type passed to the loaded image.
pub const DEFAULT_MACHINE_ID: u32 = 3892;
/// Polls of the de-init barrier before the attempt fails.
pub const DEFAULT_DEINIT_POLL_LIMIT: u32 = 0x0100_0000;

/// Boot logo shown before the kernel is staged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoConfig {
    /// Picture file name on the boot media
    pub name: &'static str,
    /// Show the logo at all
    pub show: bool,
    /// Framebuffer staging address for the picture
    pub address: u32,
}

/// Per-board boot dispatch configuration
#[derive(Debug, Clone, Copy)]
pub struct BootConfig {
    /// Image file for the single-image boot
    pub kernel_image: &'static str,
    /// Fixed physical load address of the kernel image
    pub kernel_addr: u32,
    /// Maximum kernel image length in bytes
    pub kernel_max_size: u32,
    /// Parameter block address when no parameter image is loaded
    pub param_addr: u32,
    /// Machine type handed to the kernel entry
    pub machine_id: u32,
    /// Bound on the de-init barrier wait
    pub deinit_poll_limit: u32,
    /// Clear a leftover "bootloader"/"boot-recovery" command on a normal boot
    pub clear_stale_command: bool,
    /// Optional boot logo
    pub logo: Option<LogoConfig>,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            kernel_image: DEFAULT_KERNEL_IMAGE,
            kernel_addr: DEFAULT_KERNEL_ADDR,
            kernel_max_size: DEFAULT_KERNEL_MAX_SIZE,
            param_addr: DEFAULT_PARAM_ADDR,
            machine_id: DEFAULT_MACHINE_ID,
            deinit_poll_limit: DEFAULT_DEINIT_POLL_LIMIT,
            clear_stale_command: false,
            logo: None,
        }
    }
}

impl BootConfig {
    /// Image set for the single-image boot described by this config.
    pub fn image_set(&self) -> BootImageSet<'static> {
        BootImageSet::single(self.kernel_image, self.kernel_addr, self.kernel_max_size)
    }
}
