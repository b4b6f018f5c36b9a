//! Shared foundation for the Advent Sphere workspace: configuration,
//! constants, error types, and dependency-free domain types.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
