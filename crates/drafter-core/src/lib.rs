//! Shared configuration, error, and enum types for the drafter workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util;
