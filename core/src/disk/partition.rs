// Boot media partition table (sunxi "softw411" MBR, sector 0)

use log::warn;

/// Bytes occupied by the MBR at the start of the media.
pub const MBR_SIZE: usize = 16 * 1024;
pub const MBR_MAGIC: &[u8; 8] = b"softw411";
pub const MBR_VERSION: u32 = 0x0000_0200;
pub const MBR_MAX_PART_COUNT: usize = 120;

const MBR_HEADER_SIZE: usize = 32;
const PARTITION_ENTRY_SIZE: usize = 128;
const PART_NAME_LEN: usize = 16;

// Header field offsets
const OFF_VERSION: usize = 0x04;
const OFF_MAGIC: usize = 0x08;
const OFF_PART_COUNT: usize = 0x18;

// Entry field offsets
const ENT_ADDRHI: usize = 0x00;
const ENT_ADDRLO: usize = 0x04;
const ENT_LENHI: usize = 0x08;
const ENT_LENLO: usize = 0x0C;
const ENT_CLASSNAME: usize = 0x10;
const ENT_NAME: usize = 0x20;
const ENT_RO: usize = 0x38;

fn read_u32(raw: &[u8], offset: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(b)
}

fn trim_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&c| c == 0).unwrap_or(field.len());
    &field[..end]
}

/// One partition record
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionEntry {
    pub index: usize,
    pub name: [u8; PART_NAME_LEN],
    pub classname: [u8; PART_NAME_LEN],
    pub addrhi: u32,
    pub addrlo: u32,
    pub lenhi: u32,
    pub lenlo: u32,
    pub read_only: bool,
}

impl PartitionEntry {
    fn parse(index: usize, raw: &[u8]) -> Self {
        let mut name = [0u8; PART_NAME_LEN];
        name.copy_from_slice(&raw[ENT_NAME..ENT_NAME + PART_NAME_LEN]);
        let mut classname = [0u8; PART_NAME_LEN];
        classname.copy_from_slice(&raw[ENT_CLASSNAME..ENT_CLASSNAME + PART_NAME_LEN]);

        Self {
            index,
            name,
            classname,
            addrhi: read_u32(raw, ENT_ADDRHI),
            addrlo: read_u32(raw, ENT_ADDRLO),
            lenhi: read_u32(raw, ENT_LENHI),
            lenlo: read_u32(raw, ENT_LENLO),
            read_only: read_u32(raw, ENT_RO) != 0,
        }
    }

    /// Name bytes up to the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        trim_nul(&self.name)
    }

    /// Exact name match.
    pub fn name_is(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    /// First sector of the partition. The boot stage only addresses the low word.
    pub fn start_sector(&self) -> u64 {
        self.addrlo as u64
    }

    pub fn sector_count(&self) -> u64 {
        self.lenlo as u64
    }
}

/// Read-only view over a raw MBR buffer
pub struct PartitionTable<'a> {
    raw: &'a [u8],
    count: usize,
}

impl<'a> PartitionTable<'a> {
    /// Wrap a raw MBR. The count is clamped to what the table (and buffer) can hold.
    pub fn from_bytes(raw: &'a [u8]) -> Option<Self> {
        if raw.len() < MBR_HEADER_SIZE {
            return None;
        }

        let declared = read_u32(raw, OFF_PART_COUNT) as usize;
        let fits = (raw.len() - MBR_HEADER_SIZE) / PARTITION_ENTRY_SIZE;
        let count = declared.min(MBR_MAX_PART_COUNT).min(fits);
        if count < declared {
            warn!("mbr declares {} partitions, using {}", declared, count);
        }

        Some(Self { raw, count })
    }

    pub fn has_magic(&self) -> bool {
        &self.raw[OFF_MAGIC..OFF_MAGIC + 8] == MBR_MAGIC
    }

    pub fn version(&self) -> u32 {
        read_u32(self.raw, OFF_VERSION)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn get(&self, index: usize) -> Option<PartitionEntry> {
        if index >= self.count {
            return None;
        }
        let offset = MBR_HEADER_SIZE + index * PARTITION_ENTRY_SIZE;
        Some(PartitionEntry::parse(
            index,
            &self.raw[offset..offset + PARTITION_ENTRY_SIZE],
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = PartitionEntry> + '_ {
        (0..self.count).filter_map(move |i| self.get(i))
    }

    /// First entry with exactly this name.
    pub fn find(&self, name: &str) -> Option<PartitionEntry> {
        self.iter().find(|p| p.name_is(name))
    }
}
