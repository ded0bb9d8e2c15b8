use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;

use crate::config::GeocoderConfig;
use crate::coords::LatLng;

/// Forward geocoding of a free-text place name.
///
/// Implementations absorb their own failures: `None` means "no usable
/// match", and the caller falls back to fitting the map to the results.
pub trait Geocoder {
    fn geocode(&self, place: &str) -> impl Future<Output = Option<LatLng>> + Send;
}

impl<T: Geocoder + Sync + ?Sized> Geocoder for &T {
    async fn geocode(&self, place: &str) -> Option<LatLng> {
        (**self).geocode(place).await
    }
}

/// Nominatim-compatible lookup: `GET {base}/search?q=...&format=json&limit=1`.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

#[derive(Deserialize)]
struct Place {
    lat: Value,
    lon: Value,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, config: GeocoderConfig) -> Self {
        Self { client, config }
    }

    async fn lookup(&self, place: &str) -> Result<Option<LatLng>> {
        let url = format!("{}/search", self.config.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .context("Failed to call geocoding API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Geocoding API returned {status}: {body}");
        }

        let places: Vec<Place> = resp
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        Ok(places.first().and_then(first_match))
    }
}

fn degrees(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_match(place: &Place) -> Option<LatLng> {
    let point = LatLng::new(degrees(&place.lat)?, degrees(&place.lon)?);
    point.is_valid().then_some(point)
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Option<LatLng> {
        let place = place.trim();
        if !self.config.enabled || place.is_empty() {
            return None;
        }
        match self.lookup(place).await {
            Ok(Some(point)) => {
                tracing::debug!("Geocoded {place:?} to ({}, {})", point.lat, point.lng);
                Some(point)
            }
            Ok(None) => {
                tracing::info!("No geocoding match for {place:?}");
                None
            }
            Err(e) => {
                tracing::warn!("Geocoding failed for {place:?}: {e:#}");
                None
            }
        }
    }
}
