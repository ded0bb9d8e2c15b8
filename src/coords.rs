//! Parsing of trial site coordinates.
//!
//! The upstream data source encodes sites as a string that is *almost* JSON:
//! a single `[lat, lng]` pair or a list of pairs, sometimes with Python-style
//! single quotes, tuples, or numbers wrapped in strings. [`parse_coordinates`]
//! normalizes those variants and then validates every pair;
//! [`locations_of`] is the lenient entry point used by the renderer, which
//! never fails and treats anything unparsable as "no locations".

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("coordinate text is not valid JSON after normalization: {0}")]
    Syntax(String),
    #[error("expected a [lat, lng] pair or a list of pairs, got {0}")]
    UnexpectedShape(String),
}

/// Parse a coordinate string into validated pairs.
///
/// Empty input and `[]` are valid and yield no pairs. Individual pairs that
/// are malformed or out of range are dropped; only input whose overall shape
/// cannot be understood is an error.
pub fn parse_coordinates(raw: &str) -> Result<Vec<LatLng>, CoordinateError> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(&normalized).map_err(|e| CoordinateError::Syntax(e.to_string()))?;

    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(is_scalar) => {
            // A bare pair: [lat, lng]
            Ok(pair_from_items(&items).into_iter().collect())
        }
        Value::Array(items) => {
            let total = items.len();
            let pairs: Vec<LatLng> = items.iter().filter_map(pair_from_value).collect();
            if pairs.len() < total {
                tracing::debug!(
                    "Dropped {} of {} malformed coordinate pairs",
                    total - pairs.len(),
                    total
                );
            }
            Ok(pairs)
        }
        obj @ Value::Object(_) => Ok(pair_from_value(&obj).into_iter().collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(CoordinateError::UnexpectedShape(other.to_string())),
    }
}

/// Lenient wrapper over [`parse_coordinates`]: any error becomes "no locations".
pub fn locations_of(raw: Option<&str>) -> Vec<LatLng> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match parse_coordinates(raw) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!("Ignoring unparsable coordinates {raw:?}: {e}");
            Vec::new()
        }
    }
}

/// Rewrite the quoting and tuple variants seen upstream into plain JSON.
fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '\'' => out.push('"'),
            '(' => out.push('['),
            ')' => out.push(']'),
            other => out.push(other),
        }
    }
    out
}

fn is_scalar(v: &Value) -> bool {
    matches!(v, Value::Number(_) | Value::String(_))
}

fn as_degrees(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn pair_from_items(items: &[Value]) -> Option<LatLng> {
    match items {
        [lat, lng] => {
            let pair = LatLng::new(as_degrees(lat)?, as_degrees(lng)?);
            pair.is_valid().then_some(pair)
        }
        _ => None,
    }
}

fn pair_from_value(v: &Value) -> Option<LatLng> {
    match v {
        Value::Array(items) => pair_from_items(items),
        Value::Object(map) => {
            let lat = map.get("lat").or_else(|| map.get("latitude"))?;
            let lng = map
                .get("lng")
                .or_else(|| map.get("lon"))
                .or_else(|| map.get("longitude"))?;
            pair_from_items(&[lat.clone(), lng.clone()])
        }
        _ => None,
    }
}
