//! Pollution data providers
//!
//! [`PollutionProvider`] is the seam between the request pipeline and the
//! outside world. Two implementations exist: the real OpenWeatherMap client
//! and a synthetic generator used when no credential is configured. The
//! choice is made once, at startup, by [`provider_from_config`], so tests
//! can inject either path deterministically.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::models::PollutionReading;

/// Source tag for readings fetched from OpenWeatherMap
pub const OPENWEATHERMAP_SOURCE: &str = "OpenWeatherMap";

/// Source tag for synthetic readings; downstream consumers use this to
/// tell mock data from real data
pub const MOCK_SOURCE: &str = "Mock Satellite System";

/// Default base URL of the OpenWeatherMap air pollution API
const POLLUTION_BASE_URL: &str = "http://api.openweathermap.org";

/// Failure fetching a pollution reading.
///
/// There is no partial data and no mock fallback here: a transient provider
/// failure fails the whole fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider answered with a non-success status
    #[error("provider returned HTTP {status}")]
    Api {
        /// HTTP status of the failed request
        status: u16,
    },

    /// The request never completed
    #[error("network error: {detail}")]
    Network {
        /// Transport error description
        detail: String,
    },

    /// The provider answered 200 but the body was not usable
    #[error("invalid provider response: {detail}")]
    InvalidResponse {
        /// What was wrong with the body
        detail: String,
    },
}

/// Source of air-pollution readings for a coordinate pair
#[async_trait]
pub trait PollutionProvider: Send + Sync {
    /// Fetch a reading for the given validated coordinates.
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<PollutionReading, FetchError>;
}

/// Rescale OpenWeatherMap's coarse 1-5 index onto the 0-300+ scale.
///
/// This is a deliberately rough linear remap kept for compatibility with
/// the historical record format; it is not a calibrated AQI conversion.
#[must_use]
pub const fn rescale_owm_index(owm_index: i64) -> i64 {
    owm_index * 50
}

#[derive(Debug, Deserialize)]
struct OwmComponents {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    no2: Option<f64>,
    co: Option<f64>,
    o3: Option<f64>,
    so2: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmIndex {
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct OwmEntry {
    main: OwmIndex,
    components: OwmComponents,
}

#[derive(Debug, Deserialize)]
struct OwmAirPollutionResponse {
    list: Vec<OwmEntry>,
}

/// Real provider backed by the OpenWeatherMap air pollution API
pub struct OpenWeatherMapProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherMapProvider {
    /// Create a provider with the given credential and request timeout.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("AirWatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create pollution HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: POLLUTION_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PollutionProvider for OpenWeatherMapProvider {
    #[instrument(skip(self))]
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<PollutionReading, FetchError> {
        let url = format!(
            "{}/data/2.5/air_pollution?lat={latitude}&lon={longitude}&appid={}",
            self.base_url, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "air pollution API responded");

        if !status.is_success() {
            warn!(status = status.as_u16(), "air pollution fetch failed");
            return Err(FetchError::Api {
                status: status.as_u16(),
            });
        }

        let body: OwmAirPollutionResponse =
            response.json().await.map_err(|e| FetchError::Network {
                detail: e.to_string(),
            })?;

        let entry = body.list.first().ok_or_else(|| FetchError::InvalidResponse {
            detail: "empty reading list".to_string(),
        })?;

        Ok(PollutionReading {
            aqi: rescale_owm_index(entry.main.aqi),
            pm2_5: entry.components.pm2_5,
            pm10: entry.components.pm10,
            no2: entry.components.no2,
            co: entry.components.co,
            o3: entry.components.o3,
            so2: entry.components.so2,
            source: OPENWEATHERMAP_SOURCE.to_string(),
        })
    }
}

/// Synthetic provider used when no credential is configured.
///
/// Every pollutant is drawn independently from a fixed plausible range so
/// the full pipeline stays exercisable end-to-end. Readings are tagged
/// with [`MOCK_SOURCE`].
pub struct MockSatelliteProvider;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl PollutionProvider for MockSatelliteProvider {
    async fn fetch(&self, _latitude: f64, _longitude: f64) -> Result<PollutionReading, FetchError> {
        let mut rng = rand::rng();

        Ok(PollutionReading {
            aqi: rng.random_range(30..=250),
            pm2_5: Some(round2(rng.random_range(5.0..=100.0))),
            pm10: Some(round2(rng.random_range(10.0..=150.0))),
            no2: Some(round2(rng.random_range(10.0..=80.0))),
            co: Some(round2(rng.random_range(200.0..=1000.0))),
            o3: Some(round2(rng.random_range(20.0..=120.0))),
            so2: Some(round2(rng.random_range(2.0..=50.0))),
            source: MOCK_SOURCE.to_string(),
        })
    }
}

/// Select the provider based on whether a credential is configured.
///
/// A missing or empty API key is a recognized mode, not an error.
pub fn provider_from_config(
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn PollutionProvider>> {
    match api_key {
        Some(key) if !key.is_empty() => {
            info!("using OpenWeatherMap air pollution provider");
            Ok(Arc::new(OpenWeatherMapProvider::new(
                key.to_string(),
                timeout,
            )?))
        }
        _ => {
            info!("no OpenWeatherMap API key configured, using mock satellite data");
            Ok(Arc::new(MockSatelliteProvider))
        }
    }
}
