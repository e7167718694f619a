//! Boot media image builder

use bootos_core::disk::MBR_SIZE;

pub const SECTOR: usize = 512;
/// Sector the misc partition starts at on built media.
pub const MISC_SECTOR: u32 = 40;

const ENTRY_SIZE: usize = 128;
const HEADER_SIZE: usize = 32;

/// Raw sunxi MBR with the given `(name, start_sector)` partitions.
pub fn mbr(parts: &[(&str, u32)]) -> Vec<u8> {
    let mut raw = vec![0u8; MBR_SIZE];
    raw[0x04..0x08].copy_from_slice(&0x200u32.to_le_bytes());
    raw[0x08..0x10].copy_from_slice(b"softw411");
    raw[0x18..0x1C].copy_from_slice(&(parts.len() as u32).to_le_bytes());

    for (i, (name, start)) in parts.iter().enumerate() {
        let entry = HEADER_SIZE + i * ENTRY_SIZE;
        raw[entry + 0x04..entry + 0x08].copy_from_slice(&start.to_le_bytes());
        raw[entry + 0x0C..entry + 0x10].copy_from_slice(&8u32.to_le_bytes());
        raw[entry + 0x10..entry + 0x16].copy_from_slice(b"DISK\0\0");
        raw[entry + 0x20..entry + 0x20 + name.len()].copy_from_slice(name.as_bytes());
    }
    raw
}

/// Media image with a `boot`, `misc` and `system` partition, `command`
/// pre-loaded in the misc block.
pub struct MediaBuilder {
    parts: Vec<(&'static str, u32)>,
    command: Vec<u8>,
    sectors: usize,
}

impl MediaBuilder {
    pub fn new() -> Self {
        Self {
            parts: vec![("boot", 34), ("misc", MISC_SECTOR), ("system", 48)],
            command: Vec::new(),
            sectors: 64,
        }
    }

    pub fn without_misc(mut self) -> Self {
        self.parts.retain(|(name, _)| *name != "misc");
        self
    }

    pub fn command(mut self, command: &[u8]) -> Self {
        self.command = command.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = vec![0u8; self.sectors * SECTOR];
        let table = mbr(&self.parts);
        data[..table.len()].copy_from_slice(&table);

        let misc = MISC_SECTOR as usize * SECTOR;
        data[misc..misc + self.command.len()].copy_from_slice(&self.command);
        // status and a recovery argument that must survive rewrites
        data[misc + 0x20..misc + 0x22].copy_from_slice(b"ok");
        data[misc + 0x40..misc + 0x4B].copy_from_slice(b"--wipe_data");
        data[misc + SECTOR - 1] = 0xA5;
        data
    }
}
