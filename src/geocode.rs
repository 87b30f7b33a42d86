//! Geocoding resolver
//!
//! Turns free-text place names into coordinates. The resolver consults the
//! built-in gazetteer first (no network), then the OpenWeatherMap geocoding
//! API with a bounded timeout and a single regional-suffix retry for
//! ambiguous short names. Every success carries a provenance tag describing
//! which path produced the coordinates.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::gazetteer;
use crate::models::{Provenance, ResolvedCoordinate};

/// Default base URL of the OpenWeatherMap geocoding API
const GEOCODE_BASE_URL: &str = "http://api.openweathermap.org";

/// Suffix appended on the single regional retry for ambiguous names
const REGIONAL_SUFFIX: &str = ", india";

/// Structured failure reasons for a geocoding attempt
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeocodeError {
    /// The query was empty after normalization
    #[error("Empty Query")]
    EmptyQuery,

    /// No gazetteer match and no API credential configured
    #[error("API Key Missing & No Local Match")]
    CredentialMissingNoLocalMatch,

    /// The API answered with a non-success status, or 200 with no results
    #[error("API Error: {status}")]
    Api {
        /// HTTP status of the failed attempt
        status: u16,
    },

    /// The request never completed (timeout, DNS, connection reset, ...)
    #[error("Network Error: {detail}")]
    Network {
        /// Transport error description
        detail: String,
    },
}

/// User-facing suggestions attached to every resolution failure
#[must_use]
pub fn suggestions() -> Vec<String> {
    vec![
        "Check for spelling errors".to_string(),
        "Try adding the state or country (e.g., 'Tamil Nadu, India')".to_string(),
        "Configure an OpenWeatherMap API key for global search".to_string(),
    ]
}

/// Whether a failed query qualifies for the single regional-suffix retry
#[must_use]
pub fn needs_regional_retry(normalized: &str) -> bool {
    !normalized.contains(REGIONAL_SUFFIX)
}

/// One result row from the geocoding API
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: f64,
    lon: f64,
}

/// Resolver for free-text place names
pub struct GeocodingResolver {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeocodingResolver {
    /// Create a resolver with the given optional credential and timeout.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("AirWatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create geocoding HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: GEOCODE_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve a free-text place name into coordinates.
    ///
    /// Resolution order: normalize, gazetteer, external API, one retry with
    /// `, india` appended. When both API attempts fail the error from the
    /// second attempt is returned.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> Result<ResolvedCoordinate, GeocodeError> {
        let clean_query = query.trim().to_lowercase();
        if clean_query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        debug!(
            query = %clean_query,
            credential = self.api_key.is_some(),
            "searching for location"
        );

        if let Some((latitude, longitude)) = gazetteer::lookup(&clean_query) {
            info!(query = %clean_query, "gazetteer match, skipping network lookup");
            return Ok(ResolvedCoordinate {
                latitude,
                longitude,
                provenance: Provenance::GeocodingLocal,
            });
        }

        let Some(api_key) = self.api_key.as_deref() else {
            warn!(query = %clean_query, "no API key configured and no gazetteer match");
            return Err(GeocodeError::CredentialMissingNoLocalMatch);
        };

        match self.fetch_coords(&clean_query, api_key).await {
            Ok((latitude, longitude)) => Ok(ResolvedCoordinate {
                latitude,
                longitude,
                provenance: Provenance::GeocodingApi,
            }),
            Err(first_error) if needs_regional_retry(&clean_query) => {
                debug!(error = %first_error, "first attempt failed, retrying with regional suffix");
                let retried = format!("{clean_query}{REGIONAL_SUFFIX}");
                let (latitude, longitude) = self.fetch_coords(&retried, api_key).await?;
                Ok(ResolvedCoordinate {
                    latitude,
                    longitude,
                    provenance: Provenance::GeocodingApi,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Single geocoding API call, best match only.
    async fn fetch_coords(&self, query: &str, api_key: &str) -> Result<(f64, f64), GeocodeError> {
        let url = format!(
            "{}/geo/1.0/direct?q={}&limit=1&appid={}",
            self.base_url,
            urlencoding::encode(query),
            api_key
        );

        debug!(query, "querying geocoding API");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeocodeError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "geocoding API responded");

        if !status.is_success() {
            return Err(GeocodeError::Api {
                status: status.as_u16(),
            });
        }

        let hits: Vec<GeocodeHit> = response.json().await.map_err(|e| GeocodeError::Network {
            detail: e.to_string(),
        })?;

        // An empty result list counts as an API failure even on HTTP 200,
        // so the regional retry still fires.
        hits.first()
            .map(|hit| (hit.lat, hit.lon))
            .ok_or(GeocodeError::Api {
                status: status.as_u16(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    fn resolver_without_credential() -> GeocodingResolver {
        GeocodingResolver::new(None, Duration::from_secs(5)).unwrap()
    }

    /// Canned geocoding API: records every `q` it receives and answers
    /// with the next scripted `(status, body)` pair.
    #[derive(Clone)]
    struct StubState {
        queries: Arc<Mutex<Vec<String>>>,
        responses: Arc<Mutex<Vec<(StatusCode, String)>>>,
    }

    async fn stub_handler(
        State(state): State<StubState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, String) {
        state
            .queries
            .lock()
            .unwrap()
            .push(params.get("q").cloned().unwrap_or_default());
        state.responses.lock().unwrap().remove(0)
    }

    async fn spawn_stub(
        responses: Vec<(StatusCode, String)>,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let state = StubState {
            queries: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(responses)),
        };
        let queries = state.queries.clone();

        let app = Router::new()
            .route("/geo/1.0/direct", get(stub_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (base_url, queries)
    }

    fn resolver_for(base_url: String) -> GeocodingResolver {
        GeocodingResolver::new(Some("test-key".to_string()), Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url)
    }

    const HIT_BODY: &str = r#"[{"lat": 9.9252, "lon": 78.1198, "name": "Madurai"}]"#;

    #[tokio::test]
    async fn test_gazetteer_hit_needs_no_credential() {
        let resolver = resolver_without_credential();
        let resolved = resolver.resolve("Chennai").await.unwrap();

        assert_eq!(resolved.latitude, 13.0827);
        assert_eq!(resolved.longitude, 80.2707);
        assert_eq!(resolved.provenance, Provenance::GeocodingLocal);
    }

    #[tokio::test]
    async fn test_normalization_before_lookup() {
        let resolver = resolver_without_credential();
        let resolved = resolver.resolve("  NEW york  ").await.unwrap();

        assert_eq!(resolved.latitude, 40.7128);
        assert_eq!(resolved.provenance, Provenance::GeocodingLocal);
    }

    #[tokio::test]
    async fn test_empty_query() {
        let resolver = resolver_without_credential();
        let error = resolver.resolve("   ").await.unwrap_err();
        assert_eq!(error, GeocodeError::EmptyQuery);
    }

    #[tokio::test]
    async fn test_unknown_place_without_credential() {
        let resolver = resolver_without_credential();
        let error = resolver.resolve("some village").await.unwrap_err();
        assert_eq!(error, GeocodeError::CredentialMissingNoLocalMatch);
        assert!(!suggestions().is_empty());
    }

    #[tokio::test]
    async fn test_failed_lookup_retries_once_with_regional_suffix() {
        let (base_url, queries) = spawn_stub(vec![
            (StatusCode::NOT_FOUND, String::new()),
            (StatusCode::OK, HIT_BODY.to_string()),
        ])
        .await;

        let resolver = resolver_for(base_url);
        let resolved = resolver.resolve("some village").await.unwrap();

        assert_eq!(resolved.latitude, 9.9252);
        assert_eq!(resolved.longitude, 78.1198);
        assert_eq!(resolved.provenance, Provenance::GeocodingApi);

        let queries = queries.lock().unwrap();
        assert_eq!(
            *queries,
            vec!["some village".to_string(), "some village, india".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_result_list_triggers_retry() {
        // HTTP 200 with no results counts as a failed attempt
        let (base_url, queries) = spawn_stub(vec![
            (StatusCode::OK, "[]".to_string()),
            (StatusCode::OK, HIT_BODY.to_string()),
        ])
        .await;

        let resolver = resolver_for(base_url);
        let resolved = resolver.resolve("some village").await.unwrap();

        assert_eq!(resolved.provenance, Provenance::GeocodingApi);
        assert_eq!(queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_attempt_error_is_returned() {
        let (base_url, queries) = spawn_stub(vec![
            (StatusCode::NOT_FOUND, String::new()),
            (StatusCode::SERVICE_UNAVAILABLE, String::new()),
        ])
        .await;

        let resolver = resolver_for(base_url);
        let error = resolver.resolve("some village").await.unwrap_err();

        assert_eq!(error, GeocodeError::Api { status: 503 });
        assert_eq!(queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_when_suffix_already_present() {
        let (base_url, queries) = spawn_stub(vec![(StatusCode::NOT_FOUND, String::new())]).await;

        let resolver = resolver_for(base_url);
        let error = resolver.resolve("some village, india").await.unwrap_err();

        assert_eq!(error, GeocodeError::Api { status: 404 });
        assert_eq!(queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_first_attempt_skips_retry() {
        let (base_url, queries) =
            spawn_stub(vec![(StatusCode::OK, HIT_BODY.to_string())]).await;

        let resolver = resolver_for(base_url);
        let resolved = resolver.resolve("Madurai").await.unwrap();

        assert_eq!(resolved.provenance, Provenance::GeocodingApi);
        assert_eq!(*queries.lock().unwrap(), vec!["madurai".to_string()]);
    }

    #[test]
    fn test_regional_retry_predicate() {
        assert!(needs_regional_retry("some village"));
        assert!(needs_regional_retry("paris, france"));
        assert!(!needs_regional_retry("some village, india"));
    }

    #[test]
    fn test_error_display_carries_detail() {
        assert_eq!(GeocodeError::Api { status: 404 }.to_string(), "API Error: 404");
        let network = GeocodeError::Network {
            detail: "connection refused".to_string(),
        };
        assert_eq!(network.to_string(), "Network Error: connection refused");
    }
}
