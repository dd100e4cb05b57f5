//! Typed client for the external pygeoapi geoprocessing endpoint: the only
//! place in this crate that performs outbound HTTP (spec.md §4.7).

use std::time::Duration;

use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::config::PygeoapiConfig;
use crate::error::{Error, Result};
use crate::util::point::LonLat;

pub struct GeoprocessingClient {
    http: reqwest::Client,
    base_url: String,
    enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
struct SplitCatchmentRequest {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct SplitCatchmentResponse {
    comid: i64,
    measure: f64,
    #[serde(default)]
    trim_geometry: Option<serde_json::Value>,
}

pub struct SplitCatchmentResult {
    pub comid: i64,
    pub measure: f64,
    pub trim_geometry: Option<Geometry<f64>>,
}

#[derive(Debug, Clone, Serialize)]
struct HydrolocationRequest {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct HydrolocationResponse {
    comid: i64,
    measure: f64,
}

pub struct HydrolocationResult {
    pub comid: i64,
    pub measure: f64,
}

impl GeoprocessingClient {
    pub fn new(config: &PygeoapiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .build()
            .map_err(|e| Error::ConfigurationError {
                message: format!("failed to build geoprocessing HTTP client: {e}"),
            })?;

        Ok(GeoprocessingClient {
            http,
            base_url: config.url.trim_end_matches('/').to_owned(),
            enabled: config.enabled,
        })
    }

    pub async fn split_catchment(&self, point: LonLat) -> Result<SplitCatchmentResult> {
        let body = SplitCatchmentRequest {
            lon: point.lon,
            lat: point.lat,
        };
        let response: SplitCatchmentResponse = self
            .post_with_retry("/processes/split-catchment/execution", &body)
            .await?;

        let trim_geometry = match response.trim_geometry {
            Some(value) => {
                let text = value.to_string();
                Some(crate::util::geom::parse_geojson_geometry(&text)?)
            }
            None => None,
        };

        Ok(SplitCatchmentResult {
            comid: response.comid,
            measure: response.measure,
            trim_geometry,
        })
    }

    pub async fn hydrolocation(&self, point: LonLat) -> Result<HydrolocationResult> {
        let body = HydrolocationRequest {
            lon: point.lon,
            lat: point.lat,
        };
        let response: HydrolocationResponse = self
            .post_with_retry("/processes/hydrolocation/execution", &body)
            .await?;
        Ok(HydrolocationResult {
            comid: response.comid,
            measure: response.measure,
        })
    }

    /// Posts `body` as JSON to `path`, retrying once on a connection reset.
    /// All other failures surface as [`Error::RemoteServiceError`] /
    /// [`Error::RemoteTimeout`] carrying the upstream status where
    /// available.
    async fn post_with_retry<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        if !self.enabled {
            return Err(Error::RemoteServiceError {
                status: 503,
                message: "geoprocessing service is disabled".to_owned(),
            });
        }

        let url = format!("{}{}", self.base_url, path);
        match self.send(&url, body).await {
            Ok(value) => Ok(value),
            Err(e) if is_connection_reset(&e) => self.send(&url, body).await,
            Err(e) => Err(e),
        }
    }

    async fn send<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.http.post(url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::RemoteTimeout
            } else {
                Error::RemoteServiceError {
                    status: 0,
                    message: format!("request to {url} failed: {e}"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_owned());
            return Err(Error::RemoteServiceError {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| Error::RemoteServiceError {
            status: status.as_u16(),
            message: format!("failed to decode response from {url}: {e}"),
        })
    }
}

fn is_connection_reset(error: &Error) -> bool {
    matches!(error, Error::RemoteServiceError { status: 0, .. })
}
