use crate::types::date_window::DateWindow;
use crate::types::endpoint::{Endpoint, EndpointUrls};
use crate::types::location::Location;
use crate::weather_data::error::FetchError;
use async_trait::async_trait;
use bon::Builder;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Daily aggregates requested from the API, in request order.
pub const DAILY_FIELDS: [&str; 12] = [
    "weather_code",
    "temperature_2m_mean",
    "temperature_2m_max",
    "temperature_2m_min",
    "sunset",
    "sunrise",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "precipitation_hours",
    "wind_speed_10m_max",
    "shortwave_radiation_sum",
];

/// The JSON body returned by the API, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeatherResponse(pub Value);

impl RawWeatherResponse {
    pub fn json(&self) -> &Value {
        &self.0
    }
}

/// Exponential backoff for failed requests. `max_retries == 0` disables retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_secs(1),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Builder)]
pub struct HttpSettings {
    #[builder(default = Duration::from_secs(5))]
    pub connect_timeout: Duration,
    #[builder(default = Duration::from_secs(120))]
    pub read_timeout: Duration,
    #[builder(default)]
    pub urls: EndpointUrls,
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Anything able to answer a daily-weather request for a window.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(
        &self,
        endpoint: Endpoint,
        location: &Location,
        window: DateWindow,
    ) -> Result<RawWeatherResponse, FetchError>;
}

/// Open-Meteo client. One instance is built at startup and reused for every request.
pub struct WeatherFetcher {
    client: Client,
    urls: EndpointUrls,
    retry: RetryPolicy,
}

impl WeatherFetcher {
    pub fn new(settings: HttpSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()
            .map_err(FetchError::ClientBuild)?;
        Ok(Self {
            client,
            urls: settings.urls,
            retry: settings.retry,
        })
    }

    async fn fetch_once(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<RawWeatherResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP error for {}: {}", url, status);
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        let json = response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(url.to_string(), e))?;
        Ok(RawWeatherResponse(json))
    }
}

#[async_trait]
impl WeatherSource for WeatherFetcher {
    async fn fetch(
        &self,
        endpoint: Endpoint,
        location: &Location,
        window: DateWindow,
    ) -> Result<RawWeatherResponse, FetchError> {
        let url = self.urls.url(endpoint);
        let params = query_params(location, window);
        info!("Requesting {} weather data for {}", endpoint, window);
        debug!("GET {} {:?}", url, params);

        let mut attempt = 0;
        loop {
            match self.fetch_once(url, &params).await {
                Ok(response) => {
                    info!("Weather data for {} retrieved", window);
                    return Ok(response);
                }
                Err(e) if attempt < self.retry.max_retries && e.is_transient() => {
                    let wait = self.retry.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Request for {} failed ({}), retry {}/{} in {:?}",
                        window, e, attempt, self.retry.max_retries, wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Query string for one window: coordinates, dates, fields and imperial units.
pub(crate) fn query_params(location: &Location, window: DateWindow) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", location.latitude.to_string()),
        ("longitude", location.longitude.to_string()),
        ("start_date", window.start.format("%Y-%m-%d").to_string()),
        ("end_date", window.end.format("%Y-%m-%d").to_string()),
        ("daily", DAILY_FIELDS.join(",")),
        ("timezone", location.timezone.clone()),
        ("temperature_unit", "fahrenheit".to_string()),
        ("wind_speed_unit", "mph".to_string()),
        ("precipitation_unit", "inch".to_string()),
    ]
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
