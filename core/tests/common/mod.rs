//! Common test utilities: in-memory boot media and a fake board

#![allow(dead_code)]

pub mod builder;
pub use builder::{MediaBuilder, MISC_SECTOR, SECTOR};

use std::collections::HashMap;
use std::io;

use bootos_core::config::BootConfig;
use bootos_core::platform::{
    BoardDisplay, DeinitBarrier, Handoff, ImageMerge, ImageSource, PhysMemory, ScriptConfig,
};
use bootos_core::BootOs;
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

/// In-memory block device for testing
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub block_size: usize,
    pub writes: usize,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemoryBlockDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            block_size: SECTOR,
            writes: 0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// Sector `lba` as stored on the device.
    pub fn sector(&self, lba: u32) -> &[u8] {
        let offset = lba as usize * self.block_size;
        &self.data[offset..offset + self.block_size]
    }

    /// Command field of the misc block, up to its NUL.
    pub fn misc_command(&self) -> &[u8] {
        let field = &self.sector(MISC_SECTOR)[..32];
        let end = field.iter().position(|&c| c == 0).unwrap_or(32);
        &field[..end]
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(self.block_size as u32).expect("valid block size")
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / self.block_size) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::Other, "media read error"));
        }
        let offset = start_lba.0 as usize * self.block_size;
        if offset + dst.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "media write error"));
        }
        let offset = start_lba.0 as usize * self.block_size;
        if offset + src.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write beyond end of device",
            ));
        }
        self.data[offset..offset + src.len()].copy_from_slice(src);
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Script store backed by a map
#[derive(Debug, Default)]
pub struct FakeScript {
    values: HashMap<(String, String), i32>,
}

impl FakeScript {
    /// Recovery on keys 4..=8, fastboot on 20..=30.
    pub fn standard() -> Self {
        Self::default()
            .with_range("recovery_key", 4, 8)
            .with_range("fastboot_key", 20, 30)
    }

    pub fn with_range(self, section: &str, min: i32, max: i32) -> Self {
        self.with(section, "key_min", min).with(section, "key_max", max)
    }

    pub fn with(mut self, section: &str, key: &str, value: i32) -> Self {
        self.values.insert((section.into(), key.into()), value);
        self
    }
}

impl ScriptConfig for FakeScript {
    fn fetch(&self, section: &str, key: &str) -> Option<i32> {
        self.values.get(&(section.to_string(), key.to_string())).copied()
    }
}

/// Image files keyed by name; counts opens and closes
#[derive(Debug, Default)]
pub struct FakeImages {
    pub files: HashMap<String, Vec<u8>>,
    pub opened: usize,
    pub closed: usize,
    /// Bytes withheld from every read
    pub short_by: usize,
}

impl FakeImages {
    pub fn with(mut self, name: &str, data: Vec<u8>) -> Self {
        self.files.insert(name.into(), data);
        self
    }

    pub fn open_handles(&self) -> usize {
        self.opened - self.closed
    }
}

impl ImageSource for FakeImages {
    type Handle = String;

    fn open(&mut self, name: &str) -> Option<String> {
        if !self.files.contains_key(name) {
            return None;
        }
        self.opened += 1;
        Some(name.to_string())
    }

    fn length(&mut self, handle: &String) -> usize {
        self.files.get(handle).map_or(0, Vec::len)
    }

    fn read(&mut self, handle: &mut String, dst: &mut [u8]) -> usize {
        let Some(data) = self.files.get(handle.as_str()) else {
            return 0;
        };
        let n = dst.len().min(data.len()).saturating_sub(self.short_by);
        dst[..n].copy_from_slice(&data[..n]);
        n
    }

    fn close(&mut self, _handle: String) {
        self.closed += 1;
    }
}

/// Something the board was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    AnnounceExit(bool, bool),
    Picture(String, u32),
    Merge(u32, usize),
    JumpKernel {
        reserved: u32,
        machine_id: u32,
        param_addr: u32,
        kernel_addr: u32,
    },
    FlashMode,
}

/// Board with sparse RAM regions and a recorded event log.
///
/// `park` panics so a returning jump is observable from a test.
#[derive(Debug)]
pub struct FakeBoard {
    pub regions: Vec<(u32, Vec<u8>)>,
    pub events: Vec<BoardEvent>,
    /// Polls answered "busy" before the barrier completes; `None` never completes
    pub deinit_after: Option<u32>,
    pub polls: u32,
    pub merge_ok: bool,
    pub merged: Vec<u8>,
    pub picture_ok: bool,
}

pub const KERNEL_REGION: u32 = 0x4a00_0000;
pub const PARAM_REGION: u32 = 0x4000_0000;
pub const SCRIPT_REGION: u32 = 0x4300_0000;

impl FakeBoard {
    pub fn new() -> Self {
        Self {
            regions: vec![
                (PARAM_REGION, vec![0; 0x1_0000]),
                (SCRIPT_REGION, vec![0; 0x1_0000]),
                (KERNEL_REGION, vec![0; 0x40_0000]),
            ],
            events: Vec::new(),
            deinit_after: Some(3),
            polls: 0,
            merge_ok: true,
            merged: Vec::new(),
            picture_ok: true,
        }
    }

    fn locate(&self, addr: u32, len: usize) -> Option<(usize, usize)> {
        self.regions.iter().enumerate().find_map(|(i, (base, mem))| {
            let offset = addr.checked_sub(*base)? as usize;
            (offset + len <= mem.len()).then_some((i, offset))
        })
    }

    /// Bytes at `addr`, panicking if outside RAM.
    pub fn memory(&self, addr: u32, len: usize) -> &[u8] {
        let (i, offset) = self.locate(addr, len).expect("address in fake RAM");
        &self.regions[i].1[offset..offset + len]
    }

    pub fn fill(&mut self, addr: u32, bytes: &[u8]) {
        self.region_mut(addr, bytes.len())
            .expect("address in fake RAM")
            .copy_from_slice(bytes);
    }

    pub fn jumps(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BoardEvent::JumpKernel { .. } | BoardEvent::FlashMode))
            .count()
    }
}

impl BoardDisplay for FakeBoard {
    fn announce_exit(&mut self, flag_a: bool, flag_b: bool) {
        self.events.push(BoardEvent::AnnounceExit(flag_a, flag_b));
    }

    fn show_picture(&mut self, name: &str, address: u32) -> bool {
        self.events.push(BoardEvent::Picture(name.into(), address));
        self.picture_ok
    }
}

impl Handoff for FakeBoard {
    fn jump_to_loaded_image(&mut self, reserved: u32, machine_id: u32, param_addr: u32, kernel_addr: u32) {
        self.events.push(BoardEvent::JumpKernel {
            reserved,
            machine_id,
            param_addr,
            kernel_addr,
        });
    }

    fn jump_to_flash_mode(&mut self) {
        self.events.push(BoardEvent::FlashMode);
    }

    fn park(&mut self) -> ! {
        panic!("board parked");
    }
}

impl DeinitBarrier for FakeBoard {
    fn is_complete(&mut self) -> bool {
        self.polls += 1;
        match self.deinit_after {
            Some(n) => self.polls > n,
            None => false,
        }
    }
}

impl PhysMemory for FakeBoard {
    fn region_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        let (i, offset) = self.locate(addr, len)?;
        Some(&mut self.regions[i].1[offset..offset + len])
    }

    fn copy(&mut self, src: u32, dst: u32, len: usize) -> bool {
        let Some((i, offset)) = self.locate(src, len) else {
            return false;
        };
        let bytes = self.regions[i].1[offset..offset + len].to_vec();
        match self.region_mut(dst, len) {
            Some(dst) => {
                dst.copy_from_slice(&bytes);
                true
            }
            None => false,
        }
    }
}

impl ImageMerge for FakeBoard {
    fn merge(&mut self, target: u32, staged: &[u8]) -> bool {
        self.events.push(BoardEvent::Merge(target, staged.len()));
        self.merged = staged.to_vec();
        self.merge_ok
    }
}

pub type TestBootOs<'a> = BootOs<'a, MemoryBlockDevice, FakeScript, FakeImages, FakeBoard>;

/// Everything one boot attempt needs
pub struct Rig {
    pub config: BootConfig,
    pub disk: MemoryBlockDevice,
    pub script: FakeScript,
    pub images: FakeImages,
    pub board: FakeBoard,
}

/// Recognisable kernel payload.
pub fn kernel_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

impl Rig {
    pub fn new() -> Self {
        Self::with_media(MediaBuilder::new().build())
    }

    pub fn with_media(media: Vec<u8>) -> Self {
        let config = BootConfig {
            deinit_poll_limit: 1000,
            ..BootConfig::default()
        };
        let images = FakeImages::default().with(config.kernel_image, kernel_bytes(4096));
        Self {
            config,
            disk: MemoryBlockDevice::new(media),
            script: FakeScript::standard(),
            images,
            board: FakeBoard::new(),
        }
    }

    pub fn os(&mut self) -> TestBootOs<'_> {
        BootOs::new(
            &self.config,
            &mut self.disk,
            &self.script,
            &mut self.images,
            &mut self.board,
        )
    }
}
