/// The current version of cellpress, sourced from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assembler;
pub mod commands;
pub mod compressor;
pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod types;
