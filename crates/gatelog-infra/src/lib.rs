//! Infrastructure layer - persistence and plate recognition implementations

pub mod image;
pub mod persistence;
pub mod plate_reader;
