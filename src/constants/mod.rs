//! Constants used throughout the inspector

pub mod opcodes;
pub mod syscalls;
pub mod byte_ranges;
