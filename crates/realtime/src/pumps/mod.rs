//! Per-socket I/O tasks.

pub(crate) mod ping;
pub(crate) mod read;
pub(crate) mod write;
