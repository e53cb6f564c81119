//! Data models shared by the I/O layer and the ranking engine.

pub mod composition;
pub mod job;
