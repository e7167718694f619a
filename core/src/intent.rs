//! Boot intent resolution
//!
//! Decides whether this boot should go to recovery, fastboot or the normal
//! image. A pending recovery request from an earlier stage wins outright;
//! otherwise the key code read at power-on is matched against the key
//! ranges in the script store, recovery first.

use core::fmt;

use log::info;

use crate::error::ConfigLookupMiss;
use crate::platform::ScriptConfig;

pub const RECOVERY_KEY_SECTION: &str = "recovery_key";
pub const FASTBOOT_KEY_SECTION: &str = "fastboot_key";
pub const KEY_MIN: &str = "key_min";
pub const KEY_MAX: &str = "key_max";

/// Command written to the misc block for a recovery boot.
pub const CMD_BOOT_RECOVERY: &str = "boot-recovery";
/// Command written to the misc block for a fastboot boot.
pub const CMD_BOOTLOADER: &str = "bootloader";

/// What this boot attempt is going to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootIntent {
    Normal,
    Recovery,
    Fastboot,
    /// Misc block carried the "efex" sentinel
    EmergencyReflash,
}

impl BootIntent {
    /// Misc command that hands this intent to the next stage.
    pub fn command(self) -> Option<&'static str> {
        match self {
            BootIntent::Recovery => Some(CMD_BOOT_RECOVERY),
            BootIntent::Fastboot => Some(CMD_BOOTLOADER),
            BootIntent::Normal | BootIntent::EmergencyReflash => None,
        }
    }
}

impl fmt::Display for BootIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BootIntent::Normal => "normal",
            BootIntent::Recovery => "recovery",
            BootIntent::Fastboot => "fastboot",
            BootIntent::EmergencyReflash => "efex",
        })
    }
}

/// Inclusive key-code range bound to an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub min: i32,
    pub max: i32,
}

impl KeyRange {
    /// Read `key_min`/`key_max` of `section`; both must be present.
    pub fn fetch<S: ScriptConfig + ?Sized>(
        script: &S,
        section: &'static str,
    ) -> Result<Self, ConfigLookupMiss> {
        let max = script
            .fetch(section, KEY_MAX)
            .ok_or(ConfigLookupMiss { section, key: KEY_MAX })?;
        let min = script
            .fetch(section, KEY_MIN)
            .ok_or(ConfigLookupMiss { section, key: KEY_MIN })?;
        Ok(Self { min, max })
    }

    pub fn contains(&self, key: i32) -> bool {
        key >= self.min && key <= self.max
    }
}

fn key_in_range<S: ScriptConfig + ?Sized>(script: &S, section: &'static str, key: i32) -> bool {
    match KeyRange::fetch(script, section) {
        Ok(range) => {
            info!("{} range [{}, {}]", section, range.min, range.max);
            range.contains(key)
        }
        Err(miss) => {
            info!("{}", miss);
            false
        }
    }
}

/// Resolve the boot intent for this attempt.
///
/// * `recovery_pending` - recovery already requested by an earlier stage
/// * `key_value` - key code sampled at power-on
pub fn resolve_intent<S: ScriptConfig + ?Sized>(
    recovery_pending: bool,
    key_value: i32,
    script: &S,
) -> BootIntent {
    if recovery_pending {
        info!("recovery pending from earlier stage");
        return BootIntent::Recovery;
    }
    info!("boot key code {}", key_value);

    if key_in_range(script, RECOVERY_KEY_SECTION, key_value) {
        info!("recovery key held");
        return BootIntent::Recovery;
    }
    if key_in_range(script, FASTBOOT_KEY_SECTION, key_value) {
        info!("fastboot key held");
        return BootIntent::Fastboot;
    }

    BootIntent::Normal
}
