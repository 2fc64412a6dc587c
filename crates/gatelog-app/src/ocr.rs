//! Plate reading for the entry flow
//!
//! OCR only ever pre-fills the plate field. Whatever the reader does, the
//! caller can still type or correct the plate by hand.

use log::warn;

use gatelog_domain::repository::PlateReader;
use gatelog_types::Error;

/// What the plate reader made of an image
#[derive(Debug)]
pub enum PlateReading {
    Recognized(String),
    NotDetected,
    Failed(Error),
}

impl PlateReading {
    pub fn plate(&self) -> Option<&str> {
        match self {
            PlateReading::Recognized(plate) => Some(plate),
            _ => None,
        }
    }
}

/// Run the reader and fold every outcome into a [`PlateReading`]
pub async fn read_plate<P: PlateReader>(reader: &P, image: &[u8]) -> PlateReading {
    match reader.recognize_plate(image).await {
        Ok(text) if text.trim().is_empty() => PlateReading::NotDetected,
        Ok(text) => PlateReading::Recognized(text.trim().to_string()),
        Err(err) => {
            warn!("event=plate_read status=error error={}", err);
            PlateReading::Failed(err)
        }
    }
}
