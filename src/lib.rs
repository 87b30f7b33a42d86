//! AirWatch - air pollution indicator service
//!
//! Accepts a location (city name or coordinates), resolves it to a
//! validated coordinate pair with a provenance trail, fetches an
//! air-pollution reading for that point (or synthesizes mock data when no
//! provider credential is configured), classifies it into a severity band,
//! persists the reading, and serves the history over HTTP.

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gazetteer;
pub mod geocode;
pub mod models;
pub mod pollution;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use classifier::{Classification, classify};
pub use config::AirWatchConfig;
pub use error::AirWatchError;
pub use geocode::{GeocodeError, GeocodingResolver};
pub use models::{PollutionReading, PollutionRecord, Provenance, ResolvedCoordinate};
pub use pollution::{MockSatelliteProvider, OpenWeatherMapProvider, PollutionProvider};
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
