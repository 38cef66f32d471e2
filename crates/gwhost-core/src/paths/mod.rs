//! Path utilities for gwhost data directories.
//!
//! This module provides the canonical path resolution for all gwhost components:
//! - Data root (state directory of the supervised gateway)
//! - Gateway config file, logs directory, migration marker and pid file
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod ensure;
mod error;
mod layout;
mod platform;

// Error type
pub use error::PathError;

// Platform detection and roots
pub use platform::{DATA_DIR_ENV, data_root, normalize_user_path};

// Directory operations
pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};

// Per-run file layout
pub use layout::GatewayPaths;
pub(crate) use layout::marker_path_in;
