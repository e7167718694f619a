// Boot orchestrator - picks the OS, patches the misc block, loads and jumps
//
// Init -> IntentResolved -> ControlBlockPatched -> KernelLoaded
//      -> DependentsDrained -> Dispatched
//
// Any error moves to Failed and the attempt is abandoned. An "efex" command
// in the misc block short-cuts everything after ControlBlockPatched into
// the flash-mode jump.

use gpt_disk_io::BlockIo;
use log::{error, info, warn};

use super::loader::{load_images, BootImageSet, LoadedKernel};
use super::logo::show_logo;
use crate::config::BootConfig;
use crate::disk::misc::{ControlBlockStore, CMD_EFEX};
use crate::error::{BootError, Result};
use crate::intent::{resolve_intent, BootIntent, CMD_BOOTLOADER, CMD_BOOT_RECOVERY};
use crate::platform::{Board, ImageSource, ScriptConfig};

/// Position in the boot state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    Init,
    IntentResolved,
    ControlBlockPatched,
    KernelLoaded,
    DependentsDrained,
    Dispatched,
    Failed,
}

/// Per-attempt input handed over by the earlier boot stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootInput {
    /// Recovery already requested before this stage ran
    pub recovery_pending: bool,
    /// Key code sampled at power-on
    pub key_value: i32,
}

/// Where control goes once the pipeline is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootTarget {
    Kernel(LoadedKernel),
    FlashMode,
}

/// One boot dispatch attempt over the board's collaborators.
pub struct BootOs<'a, B, S, F, P>
where
    B: BlockIo,
    S: ScriptConfig + ?Sized,
    F: ImageSource,
    P: Board,
{
    config: &'a BootConfig,
    disk: &'a mut B,
    script: &'a S,
    images: &'a mut F,
    board: &'a mut P,
    image_set: BootImageSet<'a>,
    scratch: &'a mut [u8],
    stage: BootStage,
}

impl<'a, B, S, F, P> BootOs<'a, B, S, F, P>
where
    B: BlockIo,
    S: ScriptConfig + ?Sized,
    F: ImageSource,
    P: Board,
{
    /// Single-image boot as described by `config`.
    pub fn new(
        config: &'a BootConfig,
        disk: &'a mut B,
        script: &'a S,
        images: &'a mut F,
        board: &'a mut P,
    ) -> Self {
        Self {
            config,
            disk,
            script,
            images,
            board,
            image_set: config.image_set(),
            scratch: &mut [],
            stage: BootStage::Init,
        }
    }

    /// Boot a multi-image set. `scratch` stages the parameter image.
    pub fn with_images(mut self, set: BootImageSet<'a>, scratch: &'a mut [u8]) -> Self {
        self.image_set = set;
        self.scratch = scratch;
        self
    }

    pub fn stage(&self) -> BootStage {
        self.stage
    }

    /// Image set, with `full_size` filled in once loaded.
    pub fn image_set(&self) -> &BootImageSet<'a> {
        &self.image_set
    }

    fn enter(&mut self, stage: BootStage) {
        info!("boot stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    /// Run the pipeline up to, not including, the jump.
    pub fn prepare(&mut self, input: BootInput) -> Result<BootTarget> {
        let result = self.advance(input);
        if let Err(e) = result {
            error!("boot failed: {}", e);
            self.enter(BootStage::Failed);
        }
        result
    }

    fn advance(&mut self, input: BootInput) -> Result<BootTarget> {
        let intent = resolve_intent(input.recovery_pending, input.key_value, self.script);
        info!("boot intent: {}", intent);
        self.enter(BootStage::IntentResolved);

        let intent = self.patch_control_block(intent)?;
        self.enter(BootStage::ControlBlockPatched);
        if intent == BootIntent::EmergencyReflash {
            return Ok(BootTarget::FlashMode);
        }

        if let Some(logo) = self.config.logo {
            show_logo(&mut *self.board, &logo);
        }

        let kernel = load_images(
            &mut *self.images,
            &mut *self.board,
            &mut self.image_set,
            &mut *self.scratch,
            self.config.param_addr,
        )?;
        self.enter(BootStage::KernelLoaded);

        self.drain_dependents()?;
        self.enter(BootStage::DependentsDrained);

        Ok(BootTarget::Kernel(kernel))
    }

    /// Apply `intent` to the misc control block.
    ///
    /// Returns `EmergencyReflash` if the block held the "efex" sentinel (the
    /// sentinel is cleared and persisted first), otherwise `intent` itself.
    fn patch_control_block(&mut self, intent: BootIntent) -> Result<BootIntent> {
        let mut store = ControlBlockStore::new(&mut *self.disk);

        let Some(start) = store.locate_misc_partition() else {
            return Ok(intent);
        };
        let mut message = match store.read_control(start) {
            Ok(m) => m,
            Err(e) => {
                warn!("misc: {}, leaving control block alone", e);
                return Ok(intent);
            }
        };

        if message.is_command(CMD_EFEX) {
            info!("misc: efex requested");
            message.clear_command();
            store.write_control(start, &message)?;
            return Ok(BootIntent::EmergencyReflash);
        }

        match intent.command() {
            Some(command) => {
                message.set_command(command)?;
                store.write_control(start, &message)?;
                info!("misc: {} mode", intent);
            }
            None => {
                let stale =
                    message.is_command(CMD_BOOTLOADER) || message.is_command(CMD_BOOT_RECOVERY);
                if stale && self.config.clear_stale_command {
                    info!("misc: clearing stale command");
                    message.clear_command();
                    store.write_control(start, &message)?;
                }
            }
        }

        Ok(intent)
    }

    /// Wait, bounded, for earlier stages' asynchronous de-init to finish.
    fn drain_dependents(&mut self) -> Result<()> {
        let mut polls: u32 = 0;
        while !self.board.is_complete() {
            polls += 1;
            if polls >= self.config.deinit_poll_limit {
                warn!("de-init still busy after {} polls", polls);
                return Err(BootError::DeinitTimeout);
            }
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Transfer control. Does not return; if the jump primitive comes back
    /// the board is parked.
    pub fn dispatch(&mut self, target: BootTarget) -> ! {
        match target {
            BootTarget::Kernel(kernel) => {
                info!(
                    "jump to {:#x}, params at {:#x}",
                    kernel.kernel_addr, kernel.param_addr
                );
                self.enter(BootStage::Dispatched);
                self.board.jump_to_loaded_image(
                    0,
                    self.config.machine_id,
                    kernel.param_addr,
                    kernel.kernel_addr,
                );
            }
            BootTarget::FlashMode => {
                self.board.announce_exit(true, true);
                self.enter(BootStage::Dispatched);
                self.board.jump_to_flash_mode();
            }
        }

        error!("handoff returned, parking");
        self.board.park()
    }

    /// Full attempt. Only returns if the boot failed.
    pub fn run(mut self, input: BootInput) -> BootError {
        match self.prepare(input) {
            Ok(target) => self.dispatch(target),
            Err(e) => e,
        }
    }
}
