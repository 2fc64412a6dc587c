//! Domain services

pub mod classifier;
pub mod daily_report;
pub mod plate_normalizer;

pub use classifier::{classify, Classification};
pub use daily_report::{entries_for_day, summarize_day, DailySummary};
pub use plate_normalizer::{normalize, NormalizedPlate};
