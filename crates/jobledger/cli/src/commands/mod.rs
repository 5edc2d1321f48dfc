//! CLI command implementations

pub mod config;
pub mod job;
pub mod replay;
pub mod tools;
