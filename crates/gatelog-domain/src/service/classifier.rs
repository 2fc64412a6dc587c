//! Internal / visitor classification against the registry

use gatelog_types::{RegisteredVehicle, VehicleType};

use super::plate_normalizer::normalize;

/// Result of matching a plate against the registry
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// First registry record whose plate matches
    Internal(RegisteredVehicle),
    Visitor,
}

impl Classification {
    pub fn vehicle_type(&self) -> VehicleType {
        match self {
            Classification::Internal(_) => VehicleType::Internal,
            Classification::Visitor => VehicleType::Visitor,
        }
    }

    pub fn matched(&self) -> Option<&RegisteredVehicle> {
        match self {
            Classification::Internal(vehicle) => Some(vehicle),
            Classification::Visitor => None,
        }
    }
}

/// Classify a raw plate against a registry snapshot.
///
/// Scans in registry order and returns the first match, so duplicate plates
/// resolve to the earliest record. A blank plate is always a visitor.
/// Pure and cheap enough to run on every keystroke.
pub fn classify(raw_plate: &str, registry: &[RegisteredVehicle]) -> Classification {
    let plate = normalize(raw_plate);
    if plate.is_empty() {
        return Classification::Visitor;
    }

    registry
        .iter()
        .find(|v| normalize(&v.plate_number) == plate)
        .map(|v| Classification::Internal(v.clone()))
        .unwrap_or(Classification::Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: &str, plate: &str, owner: &str) -> RegisteredVehicle {
        let mut v = RegisteredVehicle::new(plate.to_string(), owner.to_string());
        v.id = id.to_string();
        v
    }

    #[test]
    fn test_match_ignores_whitespace() {
        let registry = vec![vehicle("1", "1กก9999", "A")];
        let result = classify("1กก 9999", &registry);
        assert_eq!(result.vehicle_type(), VehicleType::Internal);
        assert_eq!(result.matched().unwrap().owner_name, "A");
    }

    #[test]
    fn test_first_match_wins() {
        let registry = vec![
            vehicle("1", "2ขค 1111", "first"),
            vehicle("2", "2ขค1111", "second"),
        ];
        let result = classify("2ขค1111", &registry);
        assert_eq!(result.matched().unwrap().id, "1");
    }

    #[test]
    fn test_no_match_is_visitor() {
        let registry = vec![vehicle("1", "1กก9999", "A")];
        assert_eq!(classify("2ขค1111", &registry), Classification::Visitor);
    }

    #[test]
    fn test_empty_registry_is_visitor() {
        assert_eq!(classify("1กก9999", &[]), Classification::Visitor);
    }

    #[test]
    fn test_blank_plate_is_visitor() {
        let registry = vec![vehicle("1", "   ", "blank")];
        assert_eq!(classify("", &registry), Classification::Visitor);
        assert_eq!(classify("  ", &registry), Classification::Visitor);
    }
}
