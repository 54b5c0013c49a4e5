use std::time::Duration;

use crate::predict::error::FetchError;
use crate::predict::location::Location;
use crate::predict::parsing::window_from_raw;
use crate::predict::types::{PassWindow, RawPass};

pub const DEFAULT_BASE_URL: &str = "https://sat.terrestre.ar";

/// Source of pass predictions for a single satellite.
#[allow(async_fn_in_trait)]
pub trait PassProvider {
    async fn fetch(&self, norad_id: u32, location: &Location) -> Result<PassWindow, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub retry_delay: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            retry_delay: Duration::from_millis(500),
            backoff_base: Duration::from_secs(10),
            backoff_max: Duration::from_secs(600),
        }
    }
}

pub struct HttpPassProvider {
    client: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

impl HttpPassProvider {
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("satlight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry_delay: settings.retry_delay,
        })
    }

    async fn fetch_once(&self, norad_id: u32, location: &Location) -> Result<PassWindow, FetchError> {
        let url = format!("{}/passes/{}", self.base_url, norad_id);
        let response = self
            .client
            .get(&url)
            .query(&[("lat", location.latitude_deg), ("lon", location.longitude_deg)])
            .query(&[("limit", 1)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let passes: Vec<RawPass> = serde_json::from_slice(&body)?;
        let nearest = passes.first().ok_or(FetchError::NoPass)?;
        window_from_raw(nearest)
    }
}

impl PassProvider for HttpPassProvider {
    async fn fetch(&self, norad_id: u32, location: &Location) -> Result<PassWindow, FetchError> {
        match self.fetch_once(norad_id, location).await {
            Err(e) if e.is_upstream_fault() => {
                log::debug!(
                    "pass fetch for {} failed ({}), retrying in {:?}",
                    norad_id,
                    e.class(),
                    self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                self.fetch_once(norad_id, location).await
            }
            result => result,
        }
    }
}
