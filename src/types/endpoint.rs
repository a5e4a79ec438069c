//! The two Open-Meteo endpoints serving daily aggregates.

use std::fmt;

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Which API a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Historical reanalysis data, lagging a few days behind today.
    Archive,
    /// Forecast API, which also serves the most recent past days.
    Forecast,
}

impl Endpoint {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Endpoint::Archive => "archive",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// # Examples
///
/// ```
/// use weather_etl::Endpoint;
///
/// assert_eq!(Endpoint::Archive.to_string(), "archive");
/// ```
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Base URLs for both endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrls {
    pub archive: String,
    pub forecast: String,
}

impl EndpointUrls {
    pub fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Archive => &self.archive,
            Endpoint::Forecast => &self.forecast,
        }
    }
}

impl Default for EndpointUrls {
    fn default() -> Self {
        Self {
            archive: DEFAULT_ARCHIVE_URL.to_string(),
            forecast: DEFAULT_FORECAST_URL.to_string(),
        }
    }
}
