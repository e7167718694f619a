// Boot media records: partition table and misc control block

pub mod misc;
pub mod partition;

pub use misc::{BootControlMessage, ControlBlockStore, CMD_EFEX, MISC_PARTITION_NAME};
pub use partition::{PartitionEntry, PartitionTable, MBR_SIZE};
