//! Outline-detection API client.
//!
//! The service accepts a bounding region plus detection options and
//! returns candidate field polygons with confidence scores:
//!
//! - Request: `POST {base_url}/v1/detect` with JSON body
//!   `{ "region": {...}, "options": {...} }`.
//! - Response: `{ "fields": [ { "polygon": [[lat, lng], ...],
//!   "confidence": 0.87, "areaHectares": 2.5 } ] }`.
//!
//! Any `areaHectares` the service reports is discarded; areas are
//! recomputed locally from the polygon.

use std::time::Duration;

use farm_map_farm_models::{BoundingRegion, Coordinate, DetectedField, DetectionOptions, Polygon};
use farm_map_geometry::{area_sq_m, ring_is_valid};

use crate::{DetectError, service_registry::DetectionService};

/// Requests field outlines for a bounding region.
///
/// Applies the service's configured per-request timeout and retries ONCE
/// on a transient transport failure (timeout or connection error). A
/// second failure, or a non-success status, surfaces as
/// [`DetectError::Unavailable`] — the caller falls back to manual
/// drawing.
///
/// # Errors
///
/// [`DetectError::Unavailable`] when the service cannot be reached after
/// the retry or answers with a failure status; [`DetectError::Http`] for
/// non-transient transport errors; [`DetectError::Parse`] when the
/// response body is malformed.
pub async fn detect(
    client: &reqwest::Client,
    service: &DetectionService,
    region: &BoundingRegion,
    options: &DetectionOptions,
) -> Result<Vec<DetectedField>, DetectError> {
    let url = format!("{}/v1/detect", service.base_url);
    let body = serde_json::json!({
        "region": region,
        "options": options,
    });
    let timeout = Duration::from_millis(service.timeout_ms);

    let resp = match send_once(client, &url, &body, timeout).await {
        Ok(resp) => resp,
        Err(err) if err.is_timeout() || err.is_connect() => {
            log::warn!("detection request failed ({err}), retrying once");
            send_once(client, &url, &body, timeout)
                .await
                .map_err(|retry_err| DetectError::Unavailable {
                    message: retry_err.to_string(),
                })?
        }
        Err(err) => return Err(DetectError::Http(err)),
    };

    if !resp.status().is_success() {
        return Err(DetectError::Unavailable {
            message: format!("detection service returned status {}", resp.status()),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

async fn send_once(
    client: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
    timeout: Duration,
) -> Result<reqwest::Response, reqwest::Error> {
    client.post(url).json(body).timeout(timeout).send().await
}

/// Parses the detection response into candidate fields.
///
/// Candidates whose rings fail validation are logged and skipped rather
/// than failing the whole batch; confidence is clamped to [0, 1].
fn parse_response(body: &serde_json::Value) -> Result<Vec<DetectedField>, DetectError> {
    let entries = body
        .get("fields")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| DetectError::Parse {
            message: "detection response missing 'fields' array".to_string(),
        })?;

    let mut candidates = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let confidence = entry
            .get("confidence")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| DetectError::Parse {
                message: format!("candidate {index} missing confidence"),
            })?
            .clamp(0.0, 1.0);

        let vertices = parse_polygon(entry, index)?;

        if let Err(err) = ring_is_valid(&vertices) {
            log::warn!("skipping detected candidate {index}: {err}");
            continue;
        }

        let area = area_sq_m(&vertices);
        candidates.push(DetectedField {
            boundary: Polygon::new(vertices),
            confidence,
            area_sq_m: area,
        });
    }

    Ok(candidates)
}

/// Parses one candidate's `polygon` array of `[lat, lng]` pairs. The
/// service closes its rings explicitly; the closing vertex is stripped
/// because boundaries close implicitly in storage.
fn parse_polygon(entry: &serde_json::Value, index: usize) -> Result<Vec<Coordinate>, DetectError> {
    let pairs = entry
        .get("polygon")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| DetectError::Parse {
            message: format!("candidate {index} missing polygon"),
        })?;

    let mut vertices = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let coords = pair.as_array().ok_or_else(|| DetectError::Parse {
            message: format!("candidate {index} polygon vertex is not an array"),
        })?;
        if coords.len() < 2 {
            return Err(DetectError::Parse {
                message: format!("candidate {index} polygon vertex has fewer than 2 elements"),
            });
        }
        let lat = coords[0].as_f64().ok_or_else(|| DetectError::Parse {
            message: format!("candidate {index} latitude is not a number"),
        })?;
        let lng = coords[1].as_f64().ok_or_else(|| DetectError::Parse {
            message: format!("candidate {index} longitude is not a number"),
        })?;
        vertices.push(Coordinate::new(lat, lng));
    }

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    Ok(vertices)
}
