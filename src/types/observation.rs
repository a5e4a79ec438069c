use chrono::NaiveDateTime;

/// Staged column names, in the order the fields are written.
pub const OBSERVATION_COLUMNS: [&str; 18] = [
    "date",
    "weather_code",
    "mean_temp",
    "max_temp",
    "min_temp",
    "precip",
    "rain_sum",
    "snowfall_sum",
    "windspeed_max",
    "shortwave_radiation",
    "precip_hours",
    "city",
    "zip_code",
    "state",
    "country",
    "sunrise",
    "sunset",
    "sys_src_load_dt",
];

/// One calendar day of weather at the configured location.
///
/// Temperatures are in °F, precipitation in inches, wind speed in mph.
/// Measurements the API reports as `null` stay `None`.
#[derive(Debug, PartialEq, Clone)]
pub struct DailyObservation {
    pub date: String,
    pub weather_code: Option<i64>,
    pub mean_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub precip: Option<f64>,
    pub rain_sum: Option<f64>,
    pub snowfall_sum: Option<f64>,
    pub windspeed_max: Option<f64>,
    pub shortwave_radiation: Option<f64>,
    pub precip_hours: Option<f64>,
    pub city: String,
    pub zip_code: String,
    pub state: String,
    pub country: String,
    /// Local time, `HH:MM:SS`.
    pub sunrise: String,
    /// Local time, `HH:MM:SS`.
    pub sunset: String,
    /// Shared by every row produced by one extraction.
    pub load_time: NaiveDateTime,
}
