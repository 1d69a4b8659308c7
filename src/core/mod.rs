//! Core domain types.

pub mod environment;
pub mod manifest;
pub mod plugin;
pub mod types;
