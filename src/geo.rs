//! Geolocation
//!
//! Best-effort, one-shot location lookup performed once at startup. Success
//! yields a free-text latitude/longitude annotation for outbound messages;
//! any failure is silently dropped with no retry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<GeoPoint>;
}

/// IP-based lookup against ip-api.com.
pub struct IpLocator {
    endpoint: String,
    http: Client,
}

impl IpLocator {
    pub fn new() -> Self {
        Self::with_endpoint("http://ip-api.com/json".to_string())
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            endpoint,
            http: Client::new(),
        }
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for IpLocator {
    async fn locate(&self) -> Result<GeoPoint> {
        let data: Value = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .context("location request failed")?
            .json()
            .await
            .context("location response was not JSON")?;

        if data["status"].as_str() != Some("success") {
            anyhow::bail!("location lookup rejected: {}", data["message"]);
        }

        let lat = data["lat"].as_f64().context("missing latitude")?;
        let lon = data["lon"].as_f64().context("missing longitude")?;
        Ok(GeoPoint { lat, lon })
    }
}

/// Resolve the location annotation once. `None` on any failure.
pub async fn resolve_annotation(provider: &dyn LocationProvider) -> Option<String> {
    match provider.locate().await {
        Ok(point) => Some(format_annotation(point)),
        Err(err) => {
            debug!(error = %err, "location unavailable, continuing without it");
            None
        }
    }
}

fn format_annotation(point: GeoPoint) -> String {
    format!(
        "Localização do usuário: Lat {}, Long {}",
        point.lat, point.lon
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLocation(GeoPoint);

    #[async_trait]
    impl LocationProvider for FixedLocation {
        async fn locate(&self) -> Result<GeoPoint> {
            Ok(self.0)
        }
    }

    struct DeniedLocation;

    #[async_trait]
    impl LocationProvider for DeniedLocation {
        async fn locate(&self) -> Result<GeoPoint> {
            anyhow::bail!("denied")
        }
    }

    #[tokio::test]
    async fn success_yields_lat_long_annotation() {
        let provider = FixedLocation(GeoPoint {
            lat: -23.55,
            lon: -46.63,
        });
        let annotation = resolve_annotation(&provider).await.unwrap();
        assert_eq!(annotation, "Localização do usuário: Lat -23.55, Long -46.63");
    }

    #[tokio::test]
    async fn failure_is_silently_omitted() {
        assert!(resolve_annotation(&DeniedLocation).await.is_none());
    }
}
