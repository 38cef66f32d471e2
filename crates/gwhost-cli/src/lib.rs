//! Command-line adapter for the gwhost gateway supervisor.
//!
//! `main.rs` is the composition root; everything here is kept in the
//! library so parsers and handlers can be tested directly.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::CliConfig;
pub use commands::{Commands, RunArgs};
pub use error::CliError;
pub use parser::Cli;
