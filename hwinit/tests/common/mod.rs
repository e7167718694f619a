//! In-memory register file

#![allow(dead_code)]

use std::collections::HashMap;

use bootos_hwinit::RegisterBlock;

/// Register block backed by a map; records every write in order
#[derive(Debug, Default)]
pub struct RegisterFile {
    pub values: HashMap<usize, u32>,
    pub writes: Vec<(usize, u32)>,
}

impl RegisterFile {
    pub fn with(mut self, offset: usize, value: u32) -> Self {
        self.values.insert(offset, value);
        self
    }
}

impl RegisterBlock for RegisterFile {
    fn read32(&self, offset: usize) -> u32 {
        self.values.get(&offset).copied().unwrap_or(0)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.values.insert(offset, value);
        self.writes.push((offset, value));
    }
}
