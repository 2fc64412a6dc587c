//! Data model for the registry and the checkpoint log

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A record held in a remotely persisted collection.
///
/// The identity is opaque. The remote store assigns the final value on
/// creation; until then the record carries a provisional local id.
pub trait Record: Clone {
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Creation time, used to order fetched collections newest-first
    fn created_at(&self) -> DateTime<Utc>;
}

/// Direction of travel through the checkpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Classification of a logged vehicle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleType {
    /// Plate matches a registry entry
    Internal,
    /// Plate matches nothing in the registry
    Visitor,
}

impl VehicleType {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleType::Internal => "INTERNAL",
            VehicleType::Visitor => "VISITOR",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Pre-registered (internal) vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredVehicle {
    /// Unique identifier, assigned by the remote store
    pub id: String,
    /// Plate number as entered (e.g. "1กก 9999")
    pub plate_number: String,
    /// Owner name
    pub owner_name: String,
    /// Department or unit
    #[serde(default)]
    pub department: Option<String>,
    /// When registered
    pub added_at: DateTime<Utc>,
}

impl RegisteredVehicle {
    pub fn new(plate_number: String, owner_name: String) -> Self {
        Self {
            id: String::new(),
            plate_number,
            owner_name,
            department: None,
            added_at: Utc::now(),
        }
    }

    pub fn with_department(mut self, department: String) -> Self {
        self.department = Some(department);
        self
    }
}

impl Record for RegisteredVehicle {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.added_at
    }
}

/// One pass through the checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Plate number as entered or as read by OCR
    pub plate_number: String,
    pub direction: Direction,
    /// Classification at creation time. Never recomputed afterwards.
    pub vehicle_type: VehicleType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
    /// Captured image as a data URL
    #[serde(default)]
    pub image_url: Option<String>,
}

impl LogEntry {
    pub fn new(plate_number: String, direction: Direction, vehicle_type: VehicleType) -> Self {
        Self {
            id: String::new(),
            plate_number,
            direction,
            vehicle_type,
            timestamp: Utc::now(),
            note: None,
            image_url: None,
        }
    }
}

impl Record for LogEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serializes_uppercase() {
        let json = serde_json::to_string(&Direction::In).unwrap();
        assert_eq!(json, "\"IN\"");
        let parsed: Direction = serde_json::from_str("\"OUT\"").unwrap();
        assert_eq!(parsed, Direction::Out);
    }

    #[test]
    fn test_vehicle_department_defaults_to_none() {
        let json = r#"{
            "id": "v1",
            "plate_number": "1กก 9999",
            "owner_name": "A",
            "added_at": "2024-05-01T08:00:00Z"
        }"#;
        let vehicle: RegisteredVehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.department, None);
        assert_eq!(vehicle.id(), "v1");
    }
}
