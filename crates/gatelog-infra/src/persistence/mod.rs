//! Persistence implementations
//!
//! This module provides a file-based implementation of the remote
//! collection trait.

mod json_file_remote;

pub use json_file_remote::{JsonFileRemote, LOG_FILE, REGISTRY_FILE};
