//! Error types for the boot dispatch pipeline

use core::fmt;

/// Result type for boot dispatch operations
pub type Result<T> = core::result::Result<T, BootError>;

/// A configuration key the script store did not have.
///
/// Never fatal: the resolver treats it as "no match".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigLookupMiss {
    /// Script section that was queried
    pub section: &'static str,
    /// Key inside the section
    pub key: &'static str,
}

impl fmt::Display for ConfigLookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no value for [{}] {}", self.section, self.key)
    }
}

/// Errors raised while staging images into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Image source could not be opened
    ImageOpenFailure,

    /// Image is larger than its descriptor allows
    ImageSizeExceeded,

    /// Short or failed read from the image source
    ImageReadFailure,

    /// Destination memory for the image is not available
    DestinationUnavailable,

    /// Parameter image could not be merged into its base
    MergeFailure,

    /// Image set has no room for another descriptor
    TooManyImages,

    /// Image set is empty
    NoImages,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageOpenFailure => write!(f, "failed to open image"),
            Self::ImageSizeExceeded => write!(f, "image larger than its size budget"),
            Self::ImageReadFailure => write!(f, "failed to read image"),
            Self::DestinationUnavailable => write!(f, "load address not available"),
            Self::MergeFailure => write!(f, "failed to merge parameter image"),
            Self::TooManyImages => write!(f, "too many boot images"),
            Self::NoImages => write!(f, "no boot image configured"),
        }
    }
}

/// Errors raised by the misc control block store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlBlockError {
    /// Block read failed
    MediaReadFailure,

    /// Block write failed; persisted state may be inconsistent
    MediaWriteFailure,

    /// Device sector size cannot hold the records
    UnsupportedSectorSize,

    /// Command does not fit the fixed command field
    CommandTooLong,
}

impl fmt::Display for ControlBlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediaReadFailure => write!(f, "boot media read failed"),
            Self::MediaWriteFailure => write!(f, "boot media write failed"),
            Self::UnsupportedSectorSize => write!(f, "unsupported sector size"),
            Self::CommandTooLong => write!(f, "command too long for control block"),
        }
    }
}

/// Errors that abort a boot attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Image staging failed
    Load(LoadError),

    /// Control block could not be persisted
    ControlBlock(ControlBlockError),

    /// Dependents never reported de-initialisation complete
    DeinitTimeout,
}

impl BootError {
    /// Negative status code handed back to the boot stage caller.
    pub fn status(&self) -> i32 {
        match self {
            Self::Load(LoadError::ImageOpenFailure) => -2,
            Self::Load(LoadError::ImageSizeExceeded) => -3,
            Self::Load(LoadError::ImageReadFailure) => -4,
            Self::Load(LoadError::DestinationUnavailable) => -5,
            Self::Load(LoadError::MergeFailure) => -6,
            Self::Load(LoadError::TooManyImages) | Self::Load(LoadError::NoImages) => -7,
            Self::ControlBlock(ControlBlockError::MediaWriteFailure) => -8,
            Self::ControlBlock(_) => -9,
            Self::DeinitTimeout => -10,
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "load kernel failed: {}", e),
            Self::ControlBlock(e) => write!(f, "control block: {}", e),
            Self::DeinitTimeout => write!(f, "timed out waiting for de-init"),
        }
    }
}

impl From<LoadError> for BootError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ControlBlockError> for BootError {
    fn from(e: ControlBlockError) -> Self {
        Self::ControlBlock(e)
    }
}
