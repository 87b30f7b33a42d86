//! Data models for location resolution and pollution records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// How a coordinate pair was obtained.
///
/// The resolver produces the two `Geocoding*` variants. `Gps` and `Manual`
/// exist for label parity with the client-supplied source tags: when
/// coordinates arrive directly from the form, the handler stores the raw
/// tag unchanged (unknown tags pass through as-is), so those two variants
/// are not constructed on that path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Device GPS fix supplied by the client
    Gps,
    /// Coordinates entered manually
    Manual,
    /// Resolved from the built-in gazetteer, no network involved
    GeocodingLocal,
    /// Resolved via the external geocoding API
    GeocodingApi,
}

impl Provenance {
    /// Human-readable label stored with each record
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gps => "GPS",
            Self::Manual => "Manual",
            Self::GeocodingLocal => "Geocoding (Local Fallback)",
            Self::GeocodingApi => "Geocoding (API)",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A validated coordinate pair with its provenance trail.
///
/// Produced exactly once per request by the resolver or by coordinate
/// pass-through; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCoordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// How the pair was obtained
    pub provenance: Provenance,
}

/// One air-pollution reading for a coordinate pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutionReading {
    /// Index on the 0-300+ scale (provider values are rescaled onto it)
    pub aqi: i64,
    /// PM2.5 concentration (μg/m³)
    pub pm2_5: Option<f64>,
    /// PM10 concentration (μg/m³)
    pub pm10: Option<f64>,
    /// NO₂ concentration (μg/m³)
    pub no2: Option<f64>,
    /// CO concentration (μg/m³)
    pub co: Option<f64>,
    /// O₃ concentration (μg/m³)
    pub o3: Option<f64>,
    /// SO₂ concentration (μg/m³)
    pub so2: Option<f64>,
    /// Data origin, `OpenWeatherMap` or `Mock Satellite System`
    pub source: String,
}

/// Payload for appending a new record to the store
#[derive(Debug, Clone)]
pub struct NewRecord {
    /// Location label (city name or formatted coordinates)
    pub location: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Rescaled air quality index
    pub aqi: i64,
    /// PM2.5 concentration
    pub pm25: Option<f64>,
    /// PM10 concentration
    pub pm10: Option<f64>,
    /// NO₂ concentration
    pub no2: Option<f64>,
    /// CO concentration
    pub co: Option<f64>,
    /// O₃ concentration
    pub o3: Option<f64>,
    /// SO₂ concentration
    pub so2: Option<f64>,
    /// Severity level from the classifier
    pub category: String,
    /// Provenance label for the coordinates
    pub location_source: String,
    /// Reported GPS accuracy in meters, if any
    pub accuracy: Option<f64>,
}

/// A persisted pollution record, append-only and never updated
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PollutionRecord {
    /// Auto-assigned, monotonically increasing identity
    pub id: i64,
    /// Location label
    pub location: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Rescaled air quality index
    pub aqi: i64,
    /// PM2.5 concentration
    pub pm25: Option<f64>,
    /// PM10 concentration
    pub pm10: Option<f64>,
    /// NO₂ concentration
    pub no2: Option<f64>,
    /// CO concentration
    pub co: Option<f64>,
    /// O₃ concentration
    pub o3: Option<f64>,
    /// SO₂ concentration
    pub so2: Option<f64>,
    /// Severity level at the time of the reading
    pub category: String,
    /// Provenance label for the coordinates
    pub location_source: String,
    /// Reported GPS accuracy in meters, if any
    pub accuracy: Option<f64>,
    /// Creation time (UTC)
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Serialize timestamps as `YYYY-MM-DD HH:MM:SS` for the JSON API
fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Format a coordinate pair as a location label with 4-decimal precision
#[must_use]
pub fn coordinate_label(latitude: f64, longitude: f64) -> String {
    format!("Coord: {latitude:.4}, {longitude:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_provenance_labels() {
        assert_eq!(Provenance::Gps.label(), "GPS");
        assert_eq!(Provenance::Manual.label(), "Manual");
        assert_eq!(
            Provenance::GeocodingLocal.label(),
            "Geocoding (Local Fallback)"
        );
        assert_eq!(Provenance::GeocodingApi.label(), "Geocoding (API)");
    }

    #[test]
    fn test_coordinate_label_precision() {
        assert_eq!(
            coordinate_label(13.082_712, 80.270_666),
            "Coord: 13.0827, 80.2707"
        );
    }

    #[test]
    fn test_record_timestamp_format() {
        let record = PollutionRecord {
            id: 1,
            location: "Chennai".to_string(),
            latitude: 13.0827,
            longitude: 80.2707,
            aqi: 120,
            pm25: Some(40.5),
            pm10: None,
            no2: None,
            co: None,
            o3: None,
            so2: None,
            category: "Unhealthy (Sensitive)".to_string(),
            location_source: "Geocoding (Local Fallback)".to_string(),
            accuracy: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 12).unwrap(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], "2024-03-05 14:30:12");
        assert_eq!(json["pm25"], 40.5);
        assert_eq!(json["pm10"], serde_json::Value::Null);
    }
}
