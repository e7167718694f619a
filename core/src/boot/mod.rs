// Boot dispatch: image staging, logo and the orchestrator

pub mod loader;
pub mod logo;
pub mod orchestrator;

pub use loader::{load_images, BootImageSet, ImageDescriptor, LoadedKernel, ScriptRegion, MAX_BOOT_IMAGES};
pub use logo::show_logo;
pub use orchestrator::{BootInput, BootOs, BootStage, BootTarget};
