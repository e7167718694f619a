//! Board collaborators
//!
//! The pipeline never touches hardware itself. Everything it needs from the
//! board is reached through the traits below; block storage goes through
//! [`gpt_disk_io::BlockIo`] like every other disk consumer in the tree.

use core::sync::atomic::{AtomicBool, Ordering};

/// Script (key/value) configuration store.
pub trait ScriptConfig {
    /// Fetch an integer value, `None` if the section or key is missing.
    fn fetch(&self, section: &str, key: &str) -> Option<i32>;
}

/// File-style source the boot images are read from.
pub trait ImageSource {
    type Handle;

    fn open(&mut self, name: &str) -> Option<Self::Handle>;

    /// Length of the opened image in bytes.
    fn length(&mut self, handle: &Self::Handle) -> usize;

    /// Read up to `dst.len()` bytes from the start of the image.
    /// Returns the number of bytes read.
    fn read(&mut self, handle: &mut Self::Handle, dst: &mut [u8]) -> usize;

    fn close(&mut self, handle: Self::Handle);
}

/// Display teardown and logo output.
pub trait BoardDisplay {
    /// Tell the display driver the boot stage is leaving.
    fn announce_exit(&mut self, flag_a: bool, flag_b: bool);

    /// Show a picture from the boot media. Returns false if it could not.
    fn show_picture(&mut self, name: &str, address: u32) -> bool;
}

/// Raw transfer-of-control primitives.
///
/// On hardware neither jump returns. Simulations may return from them; the
/// pipeline then falls into [`Handoff::park`].
pub trait Handoff {
    /// Jump to a loaded image: `r0 = reserved`, `r1 = machine_id`, `r2 = param_addr`.
    fn jump_to_loaded_image(&mut self, reserved: u32, machine_id: u32, param_addr: u32, kernel_addr: u32);

    /// Enter the low-level download/flash (FEL) mode.
    fn jump_to_flash_mode(&mut self);

    /// Terminal busy-wait, reached only if a jump came back.
    fn park(&mut self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Completion signal for the asynchronous de-init work of earlier stages.
pub trait DeinitBarrier {
    fn is_complete(&mut self) -> bool;
}

/// Physical memory the images are staged into.
pub trait PhysMemory {
    /// Writable view of `len` bytes at physical `addr`, if it is RAM we may use.
    fn region_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]>;

    /// Copy `len` bytes between physical addresses. Returns false on failure.
    fn copy(&mut self, src: u32, dst: u32, len: usize) -> bool;
}

/// Merges the staged parameter image into its final location.
pub trait ImageMerge {
    fn merge(&mut self, target: u32, staged: &[u8]) -> bool;
}

/// Everything the orchestrator needs from the board besides disk, script and image source.
pub trait Board: BoardDisplay + Handoff + DeinitBarrier + PhysMemory + ImageMerge {}

impl<T: BoardDisplay + Handoff + DeinitBarrier + PhysMemory + ImageMerge> Board for T {}

/// Single-shot completion flag, signalled from a completion handler.
pub struct Completion {
    done: AtomicBool,
}

impl Completion {
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub fn is_signalled(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.done.store(false, Ordering::Release);
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl DeinitBarrier for &Completion {
    fn is_complete(&mut self) -> bool {
        self.is_signalled()
    }
}

/// Identity-mapped physical memory (MMU off or 1:1 mapping).
pub struct IdentityMemory {
    lowest: u32,
    highest: u32,
}

impl IdentityMemory {
    /// # Safety
    /// `[lowest, highest)` must be RAM the boot stage owns, identity mapped,
    /// and not overlap anything still in use (stack, this code, DMA buffers).
    pub const unsafe fn new(lowest: u32, highest: u32) -> Self {
        Self { lowest, highest }
    }

    fn contains(&self, addr: u32, len: usize) -> bool {
        let end = addr as u64 + len as u64;
        addr >= self.lowest && end <= self.highest as u64
    }
}

impl PhysMemory for IdentityMemory {
    fn region_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        if !self.contains(addr, len) {
            return None;
        }
        // SAFETY: range checked against the window promised in `new`
        Some(unsafe { core::slice::from_raw_parts_mut(addr as usize as *mut u8, len) })
    }

    fn copy(&mut self, src: u32, dst: u32, len: usize) -> bool {
        if !self.contains(src, len) || !self.contains(dst, len) {
            return false;
        }
        // SAFETY: both ranges lie in the owned window; `copy` handles overlap
        unsafe {
            core::ptr::copy(src as usize as *const u8, dst as usize as *mut u8, len);
        }
        true
    }
}
