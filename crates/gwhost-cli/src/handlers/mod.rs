//! Command handlers.
//!
//! Handlers are thin: resolve inputs, call into `gwhost-core` /
//! `gwhost-runtime`, format output for the terminal. Rendering lives in
//! plain functions so it can be tested without a terminal.

pub mod migrate;
pub mod open_logs;
pub mod paths;
pub mod run;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support;
