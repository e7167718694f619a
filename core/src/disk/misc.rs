//! Misc partition control block
//!
//! The first sector of the `misc` partition carries an Android
//! `bootloader_message`. Only its 32-byte command field matters here: it is
//! the one piece of durable state passed between boot attempts.
//!
//! ```text
//! 0x000 command   [u8; 32]   "", "efex", "bootloader" or "boot-recovery"
//! 0x020 status    [u8; 32]
//! 0x040 recovery  [u8; 768]
//! ```
//!
//! Every access is a single whole-sector read or write. Bytes beyond the
//! command field are written back exactly as they were read. On 512-byte
//! media the recovery field is cut short by the sector end.

use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::{info, warn};

use super::partition::{PartitionTable, MBR_SIZE};
use crate::error::ControlBlockError;

pub const MISC_PARTITION_NAME: &str = "misc";

/// Sentinel asking the boot stage to enter flash (FEL) mode.
pub const CMD_EFEX: &str = "efex";

pub const COMMAND_LEN: usize = 32;
pub const STATUS_LEN: usize = 32;
pub const RECOVERY_LEN: usize = 768;

const OFF_COMMAND: usize = 0x000;
const OFF_STATUS: usize = 0x020;
const OFF_RECOVERY: usize = 0x040;

/// Largest sector the store will buffer.
pub const MAX_SECTOR_SIZE: usize = 4096;
/// Smallest sector that can hold the command field.
pub const MIN_SECTOR_SIZE: usize = 512;

fn field_str(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&c| c == 0).unwrap_or(field.len());
    &field[..end]
}

/// In-memory copy of the misc sector
#[derive(Clone)]
pub struct BootControlMessage {
    sector: [u8; MAX_SECTOR_SIZE],
    len: usize,
}

impl BootControlMessage {
    /// Wrap a raw sector image. `raw` must be a supported sector size.
    pub fn from_sector(raw: &[u8]) -> Result<Self, ControlBlockError> {
        if raw.len() < MIN_SECTOR_SIZE || raw.len() > MAX_SECTOR_SIZE {
            return Err(ControlBlockError::UnsupportedSectorSize);
        }
        let mut sector = [0u8; MAX_SECTOR_SIZE];
        sector[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            sector,
            len: raw.len(),
        })
    }

    /// Raw sector bytes, exactly one sector long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.sector[..self.len]
    }

    /// Whole fixed-width command field, padding included.
    pub fn command_field(&self) -> &[u8] {
        &self.sector[OFF_COMMAND..OFF_COMMAND + COMMAND_LEN]
    }

    /// Command up to its terminating NUL.
    pub fn command(&self) -> &[u8] {
        field_str(self.command_field())
    }

    pub fn is_command(&self, command: &str) -> bool {
        self.command() == command.as_bytes()
    }

    pub fn status(&self) -> &[u8] {
        field_str(&self.sector[OFF_STATUS..OFF_STATUS + STATUS_LEN])
    }

    pub fn recovery(&self) -> &[u8] {
        field_str(&self.sector[OFF_RECOVERY..OFF_RECOVERY + RECOVERY_LEN])
    }

    /// Zero the whole command field.
    pub fn clear_command(&mut self) {
        self.sector[OFF_COMMAND..OFF_COMMAND + COMMAND_LEN].fill(0);
    }

    /// Replace the command. The field is zero-filled first so a shorter
    /// command never inherits the tail of a longer one.
    pub fn set_command(&mut self, command: &str) -> Result<(), ControlBlockError> {
        let bytes = command.as_bytes();
        if bytes.len() >= COMMAND_LEN {
            return Err(ControlBlockError::CommandTooLong);
        }
        self.clear_command();
        self.sector[OFF_COMMAND..OFF_COMMAND + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// Reads and writes the control block through the block device
pub struct ControlBlockStore<'d, B: BlockIo> {
    disk: &'d mut B,
}

impl<'d, B: BlockIo> ControlBlockStore<'d, B> {
    pub fn new(disk: &'d mut B) -> Self {
        Self { disk }
    }

    fn sector_size(&self) -> Result<usize, ControlBlockError> {
        let size = self.disk.block_size().to_u32() as usize;
        if !(MIN_SECTOR_SIZE..=MAX_SECTOR_SIZE).contains(&size) || MBR_SIZE % size != 0 {
            return Err(ControlBlockError::UnsupportedSectorSize);
        }
        Ok(size)
    }

    /// Start sector of the first partition named `misc`.
    ///
    /// A missing partition or an unreadable MBR both yield `None`: the
    /// caller skips the control block and boots on.
    pub fn locate_misc_partition(&mut self) -> Option<u64> {
        if let Err(e) = self.sector_size() {
            warn!("mbr: {}", e);
            return None;
        }

        let mut buffer = [0u8; MBR_SIZE];
        if self.disk.read_blocks(Lba(0), &mut buffer).is_err() {
            warn!("mbr: read failed");
            return None;
        }

        let table = PartitionTable::from_bytes(&buffer)?;
        if !table.has_magic() {
            warn!("mbr: bad magic, scanning anyway");
        }

        match table.find(MISC_PARTITION_NAME) {
            Some(misc) => {
                info!("misc partition at sector {}", misc.start_sector());
                Some(misc.start_sector())
            }
            None => {
                info!("no misc partition");
                None
            }
        }
    }

    /// One sector read at `start_sector`.
    pub fn read_control(&mut self, start_sector: u64) -> Result<BootControlMessage, ControlBlockError> {
        let size = self.sector_size()?;
        let mut data = [0u8; MAX_SECTOR_SIZE];
        self.disk
            .read_blocks(Lba(start_sector), &mut data[..size])
            .map_err(|_| ControlBlockError::MediaReadFailure)?;
        BootControlMessage::from_sector(&data[..size])
    }

    /// One full-sector write at `start_sector`.
    pub fn write_control(
        &mut self,
        start_sector: u64,
        message: &BootControlMessage,
    ) -> Result<(), ControlBlockError> {
        if message.as_bytes().len() != self.sector_size()? {
            return Err(ControlBlockError::UnsupportedSectorSize);
        }
        self.disk
            .write_blocks(Lba(start_sector), message.as_bytes())
            .map_err(|_| ControlBlockError::MediaWriteFailure)?;
        self.disk
            .flush()
            .map_err(|_| ControlBlockError::MediaWriteFailure)
    }
}
