//! BootOS Core Library
//!
//! Boot-stage OS selection and dispatch: resolve what the user asked for at
//! power-on, record it in the misc control block, stage the kernel and hand
//! over control. Hardware is reached only through the traits in
//! [`platform`], so the whole pipeline runs on a host for testing.
//!
//! Designed to be no_std compatible.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::new_without_default)]

pub mod boot;
pub mod config;
pub mod disk;
pub mod error;
pub mod intent;
pub mod logger;
pub mod platform;

pub use boot::{BootImageSet, BootInput, BootOs, BootStage, BootTarget, ImageDescriptor, LoadedKernel};
pub use config::BootConfig;
pub use error::{BootError, ControlBlockError, ConfigLookupMiss, LoadError, Result};
pub use intent::{resolve_intent, BootIntent};
