//! HTTP handlers for the AirWatch service
//!
//! `POST /fetch` is the interesting one: it walks the request through the
//! accuracy gate, location resolution, the pollution fetch, classification
//! and persistence, converting each failure into the structured JSON error
//! shape at the step where it occurs. The read endpoints are plain
//! projections of the record store.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::classifier::{self, Classification};
use crate::error::AirWatchError;
use crate::geocode::GeocodingResolver;
use crate::models::{self, NewRecord, PollutionReading, PollutionRecord};
use crate::pollution::PollutionProvider;
use crate::store::RecordStore;

/// GPS fixes looser than this many meters are rejected
const ACCURACY_LIMIT_METERS: f64 = 500.0;

/// Shared state for all handlers
pub struct AppState {
    /// Durable record store
    pub store: RecordStore,
    /// Location resolver
    pub resolver: GeocodingResolver,
    /// Selected pollution provider (real or mock)
    pub pollution: Arc<dyn PollutionProvider>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/fetch", post(fetch_data))
        .route("/api/data", get(api_data))
        .route("/history", get(history))
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

/// Form body of `POST /fetch`
#[derive(Debug, Deserialize)]
pub struct FetchForm {
    /// Free-text city or place name
    pub city: Option<String>,
    /// Latitude as a numeric string
    pub lat: Option<String>,
    /// Longitude as a numeric string
    pub lon: Option<String>,
    /// Reported accuracy in meters, as a string
    pub accuracy: Option<String>,
    /// Coordinate source tag; defaults to `Manual`
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "Manual".to_string()
}

/// Success body of `POST /fetch`
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    /// Always `success`
    pub status: &'static str,
    /// The fetched reading
    pub data: PollutionReading,
    /// Severity classification of the reading
    pub classification: Classification,
    /// Identity of the newly persisted record
    pub record_id: i64,
}

/// Reject low-accuracy GPS fixes before doing any work.
///
/// Only `GPS`-sourced requests are gated; an accuracy value that does not
/// parse as a number is treated as "no accuracy information".
fn check_accuracy_gate(source: &str, accuracy: Option<&str>) -> Result<(), AirWatchError> {
    if source != "GPS" {
        return Ok(());
    }

    let Some(raw) = accuracy else {
        return Ok(());
    };

    match raw.trim().parse::<f64>() {
        Ok(value) if value > ACCURACY_LIMIT_METERS => Err(AirWatchError::validation(format!(
            "Accuracy too low ({value}m). Please try again or enter city manually."
        ))),
        _ => Ok(()),
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, AirWatchError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AirWatchError::validation("Invalid coordinates or accuracy format"))
}

fn validate_ranges(latitude: f64, longitude: f64) -> Result<(), AirWatchError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AirWatchError::validation(format!(
            "Latitude must be between -90 and 90, got: {latitude}"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AirWatchError::validation(format!(
            "Longitude must be between -180 and 180, got: {longitude}"
        )));
    }
    Ok(())
}

/// Treat empty form strings the same as absent fields.
fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

/// `POST /fetch`: resolve the location, fetch a reading, classify and
/// persist it.
#[instrument(skip(state, form), fields(source = %form.source))]
async fn fetch_data(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FetchForm>,
) -> Result<Json<FetchResponse>, AirWatchError> {
    check_accuracy_gate(&form.source, form.accuracy.as_deref())?;

    let city = non_empty(form.city.as_deref());
    let lat_raw = non_empty(form.lat.as_deref());
    let lon_raw = non_empty(form.lon.as_deref());

    let (latitude, longitude, location_source) = match (lat_raw, lon_raw) {
        (Some(lat), Some(lon)) => {
            // Coordinates supplied directly; provenance is the client's tag
            (parse_coordinate(lat)?, parse_coordinate(lon)?, form.source.clone())
        }
        _ => {
            let Some(city) = city else {
                return Err(AirWatchError::validation("No location provided"));
            };

            let resolved = state
                .resolver
                .resolve(city)
                .await
                .map_err(|e| AirWatchError::resolution(city, &e))?;

            info!(
                city,
                latitude = resolved.latitude,
                longitude = resolved.longitude,
                provenance = resolved.provenance.label(),
                "resolved location"
            );

            (
                resolved.latitude,
                resolved.longitude,
                resolved.provenance.label().to_string(),
            )
        }
    };

    validate_ranges(latitude, longitude)?;

    let accuracy = match non_empty(form.accuracy.as_deref()) {
        Some(raw) => Some(
            raw.parse::<f64>()
                .map_err(|_| AirWatchError::validation("Invalid coordinates or accuracy format"))?,
        ),
        None => None,
    };

    info!(
        source = %location_source,
        latitude,
        longitude,
        accuracy,
        "location trace"
    );

    let reading = state.pollution.fetch(latitude, longitude).await?;
    let classification = classifier::classify(reading.aqi);

    let record = NewRecord {
        location: city.map_or_else(|| models::coordinate_label(latitude, longitude), String::from),
        latitude,
        longitude,
        aqi: reading.aqi,
        pm25: reading.pm2_5,
        pm10: reading.pm10,
        no2: reading.no2,
        co: reading.co,
        o3: reading.o3,
        so2: reading.so2,
        category: classification.level.to_string(),
        location_source,
        accuracy,
    };

    let record_id = state
        .store
        .insert(&record)
        .await
        .map_err(|e| AirWatchError::database(format!("{e:#}")))?;

    Ok(Json(FetchResponse {
        status: "success",
        data: reading,
        classification,
        record_id,
    }))
}

/// `GET /api/data`: the 10 most recent records, newest first.
async fn api_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PollutionRecord>>, AirWatchError> {
    let records = state
        .store
        .recent(10)
        .await
        .map_err(|e| AirWatchError::database(format!("{e:#}")))?;

    Ok(Json(records))
}

/// `GET /`: landing page.
async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>AirWatch</title>
</head>
<body>
    <h1>AirWatch</h1>
    <p>Air pollution indicator service.</p>
    <form method="post" action="/fetch">
        <label>City: <input name="city" placeholder="Chennai"></label>
        <input type="hidden" name="source" value="Manual">
        <button type="submit">Fetch</button>
    </form>
    <p><a href="/history">History</a> | <a href="/dashboard">Dashboard</a> |
       <a href="/api/data">Recent data (JSON)</a></p>
</body>
</html>"#,
    )
}

/// `GET /history`: all records rendered as a table, newest first.
async fn history(State(state): State<Arc<AppState>>) -> Result<Html<String>, AirWatchError> {
    let records = state
        .store
        .all()
        .await
        .map_err(|e| AirWatchError::database(format!("{e:#}")))?;

    let rows: String = records
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.4}, {:.4}</td><td>{}</td><td>{}</td>\
                 <td>{}</td><td>{}</td></tr>\n",
                r.id,
                html_escape(&r.location),
                r.latitude,
                r.longitude,
                r.aqi,
                html_escape(&r.category),
                html_escape(&r.location_source),
                r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            )
        })
        .collect();

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>AirWatch - History</title>
</head>
<body>
    <h1>Reading History</h1>
    <table border="1">
        <tr><th>ID</th><th>Location</th><th>Coordinates</th><th>AQI</th>
            <th>Category</th><th>Source</th><th>Timestamp (UTC)</th></tr>
        {rows}
    </table>
    <p><a href="/">Back</a></p>
</body>
</html>"#
    )))
}

/// `GET /dashboard`: summary page over the recent records.
async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, AirWatchError> {
    let records = state
        .store
        .recent(10)
        .await
        .map_err(|e| AirWatchError::database(format!("{e:#}")))?;

    let latest = records.first().map_or_else(
        || "<p>No readings yet.</p>".to_string(),
        |r| {
            format!(
                "<p>Latest: <strong>{}</strong> — AQI {} ({})</p>",
                html_escape(&r.location),
                r.aqi,
                html_escape(&r.category)
            )
        },
    );

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>AirWatch - Dashboard</title>
</head>
<body>
    <h1>Dashboard</h1>
    {latest}
    <p>{count} reading(s) in the last 10 records.</p>
    <p><a href="/">Back</a></p>
</body>
</html>"#,
        count = records.len()
    )))
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
