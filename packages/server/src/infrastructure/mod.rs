//! Infrastructure layer: wire formats, transport sinks and storage.

pub mod dto;
pub mod repository;
pub mod sink;
