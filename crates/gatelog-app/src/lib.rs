//! Application service layer - sync controller, config, logging

pub mod config;
pub mod logging;
pub mod ocr;
pub mod repository;
pub mod sync;

pub use sync::{LoadReport, SubmittedEntry, SyncController};
