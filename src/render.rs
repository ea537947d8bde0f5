//! Replay of stored simulation states into frames.

pub mod backend;
pub mod cpu;
pub mod replay;
pub mod scratch_pool;
