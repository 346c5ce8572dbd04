//! Device location as reported by the client

use async_trait::async_trait;
use shared::GpsCoordinates;

use super::{EnrichmentError, Geolocator};

/// Coordinates the browser shared with us, or `None` when the grower denied
/// location access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedLocation(pub Option<GpsCoordinates>);

impl ReportedLocation {
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Self(Some(GpsCoordinates::new(latitude, longitude))),
            _ => Self(None),
        }
    }
}

#[async_trait]
impl Geolocator for ReportedLocation {
    async fn locate(&self) -> Result<GpsCoordinates, EnrichmentError> {
        self.0
            .filter(GpsCoordinates::is_valid)
            .ok_or(EnrichmentError::LocationDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_coordinate_is_denial() {
        let location = ReportedLocation::from_parts(Some(18.79), None);
        assert!(matches!(location.locate().await, Err(EnrichmentError::LocationDenied)));
    }

    #[tokio::test]
    async fn test_out_of_range_coordinates_are_rejected() {
        let location = ReportedLocation::from_parts(Some(123.0), Some(98.98));
        assert!(location.locate().await.is_err());
    }

    #[tokio::test]
    async fn test_valid_coordinates() {
        let location = ReportedLocation::from_parts(Some(18.7883), Some(98.9853));
        let coords = location.locate().await.unwrap();
        assert_eq!(coords.latitude, 18.7883);
    }
}
