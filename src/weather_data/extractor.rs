use crate::types::location::Location;
use crate::types::observation::DailyObservation;
use crate::weather_data::error::MalformedResponseError;
use crate::weather_data::fetcher::RawWeatherResponse;
use chrono::{Local, NaiveDateTime};
use log::info;
use serde_json::{Map, Value};

const KEY_DAILY: &str = "daily";
const COL_TIME: &str = "time";
const COL_WEATHER_CODE: &str = "weather_code";
const COL_TEMP_MEAN: &str = "temperature_2m_mean";
const COL_TEMP_MAX: &str = "temperature_2m_max";
const COL_TEMP_MIN: &str = "temperature_2m_min";
const COL_PRECIP: &str = "precipitation_sum";
const COL_RAIN: &str = "rain_sum";
const COL_SNOWFALL: &str = "snowfall_sum";
const COL_WIND_MAX: &str = "wind_speed_10m_max";
const COL_SHORTWAVE: &str = "shortwave_radiation_sum";
const COL_PRECIP_HOURS: &str = "precipitation_hours";
const COL_SUNRISE: &str = "sunrise";
const COL_SUNSET: &str = "sunset";

/// A `daily` array, already checked to be as long as `daily.time`.
struct DailyColumn<'a> {
    name: &'static str,
    values: &'a [Value],
}

impl<'a> DailyColumn<'a> {
    fn field_name(&self, idx: usize) -> String {
        format!("{}.{}[{}]", KEY_DAILY, self.name, idx)
    }

    fn opt_float(&self, idx: usize) -> Result<Option<f64>, MalformedResponseError> {
        match &self.values[idx] {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(MalformedResponseError::UnexpectedType {
                field: self.field_name(idx),
                expected: "number or null",
            }),
        }
    }

    fn opt_int(&self, idx: usize) -> Result<Option<i64>, MalformedResponseError> {
        let value = match &self.values[idx] {
            Value::Null => return Ok(None),
            Value::Number(n) => n.as_i64().or_else(|| {
                // Codes occasionally come back as 3.0 rather than 3.
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            _ => None,
        };
        value
            .map(Some)
            .ok_or_else(|| MalformedResponseError::UnexpectedType {
                field: self.field_name(idx),
                expected: "integer or null",
            })
    }

    fn string(&self, idx: usize) -> Result<&'a str, MalformedResponseError> {
        self.values[idx]
            .as_str()
            .ok_or_else(|| MalformedResponseError::UnexpectedType {
                field: self.field_name(idx),
                expected: "string",
            })
    }

    /// Turns `YYYY-MM-DDTHH:MM` into `HH:MM:00`. No timezone conversion happens.
    fn time_of_day(&self, idx: usize) -> Result<String, MalformedResponseError> {
        let raw = self.string(idx)?;
        match raw.split_once('T') {
            Some((_, time)) if !time.is_empty() => Ok(format!("{time}:00")),
            _ => Err(MalformedResponseError::InvalidTimestamp {
                field: self.field_name(idx),
                value: raw.to_string(),
            }),
        }
    }
}

fn get_column<'a>(
    daily: &'a Map<String, Value>,
    name: &'static str,
    expected_len: Option<usize>,
) -> Result<DailyColumn<'a>, MalformedResponseError> {
    let values = daily
        .get(name)
        .ok_or_else(|| MalformedResponseError::MissingField(format!("{KEY_DAILY}.{name}")))?
        .as_array()
        .ok_or_else(|| MalformedResponseError::UnexpectedType {
            field: format!("{KEY_DAILY}.{name}"),
            expected: "array",
        })?;

    if let Some(expected) = expected_len {
        if values.len() != expected {
            return Err(MalformedResponseError::LengthMismatch {
                field: format!("{KEY_DAILY}.{name}"),
                expected,
                found: values.len(),
            });
        }
    }

    Ok(DailyColumn { name, values })
}

/// Flattens the column-oriented `daily` object into one observation per day,
/// stamped with the current local time.
pub fn extract(
    response: &RawWeatherResponse,
    location: &Location,
) -> Result<Vec<DailyObservation>, MalformedResponseError> {
    extract_at(response, location, Local::now().naive_local())
}

/// Same as [`extract`], with an explicit load timestamp.
pub fn extract_at(
    response: &RawWeatherResponse,
    location: &Location,
    load_time: NaiveDateTime,
) -> Result<Vec<DailyObservation>, MalformedResponseError> {
    let daily = response
        .json()
        .get(KEY_DAILY)
        .ok_or_else(|| MalformedResponseError::MissingField(KEY_DAILY.to_string()))?
        .as_object()
        .ok_or_else(|| MalformedResponseError::UnexpectedType {
            field: KEY_DAILY.to_string(),
            expected: "object",
        })?;

    let time = get_column(daily, COL_TIME, None)?;
    let n = time.values.len();
    let weather_code = get_column(daily, COL_WEATHER_CODE, Some(n))?;
    let temp_mean = get_column(daily, COL_TEMP_MEAN, Some(n))?;
    let temp_max = get_column(daily, COL_TEMP_MAX, Some(n))?;
    let temp_min = get_column(daily, COL_TEMP_MIN, Some(n))?;
    let precip = get_column(daily, COL_PRECIP, Some(n))?;
    let rain = get_column(daily, COL_RAIN, Some(n))?;
    let snowfall = get_column(daily, COL_SNOWFALL, Some(n))?;
    let wind_max = get_column(daily, COL_WIND_MAX, Some(n))?;
    let shortwave = get_column(daily, COL_SHORTWAVE, Some(n))?;
    let precip_hours = get_column(daily, COL_PRECIP_HOURS, Some(n))?;
    let sunrise = get_column(daily, COL_SUNRISE, Some(n))?;
    let sunset = get_column(daily, COL_SUNSET, Some(n))?;

    info!("Processing {} rows of weather data...", n);
    let mut observations = Vec::with_capacity(n);
    for i in 0..n {
        observations.push(DailyObservation {
            date: time.string(i)?.to_string(),
            weather_code: weather_code.opt_int(i)?,
            mean_temp: temp_mean.opt_float(i)?,
            max_temp: temp_max.opt_float(i)?,
            min_temp: temp_min.opt_float(i)?,
            precip: precip.opt_float(i)?,
            rain_sum: rain.opt_float(i)?,
            snowfall_sum: snowfall.opt_float(i)?,
            windspeed_max: wind_max.opt_float(i)?,
            shortwave_radiation: shortwave.opt_float(i)?,
            precip_hours: precip_hours.opt_float(i)?,
            city: location.city.clone(),
            zip_code: location.zip.clone(),
            state: location.state.clone(),
            country: location.country.clone(),
            sunrise: sunrise.time_of_day(i)?,
            sunset: sunset.time_of_day(i)?,
            load_time,
        });
    }
    info!("Finished processing {} rows of weather data.", n);

    Ok(observations)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    /// A response shaped like the archive API's, one entry per date.
    pub(crate) fn sample_response(dates: &[NaiveDate]) -> RawWeatherResponse {
        let n = dates.len();
        let time: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        let sunrise: Vec<String> = time.iter().map(|d| format!("{d}T05:45")).collect();
        let sunset: Vec<String> = time.iter().map(|d| format!("{d}T20:40")).collect();
        RawWeatherResponse(json!({
            "latitude": 35.16,
            "longitude": -84.88,
            "timezone": "America/New_York",
            "daily": {
                "time": time,
                "weather_code": vec![3; n],
                "temperature_2m_mean": vec![72.5; n],
                "temperature_2m_max": vec![84.1; n],
                "temperature_2m_min": vec![63.0; n],
                "precipitation_sum": vec![0.12; n],
                "rain_sum": vec![0.12; n],
                "snowfall_sum": vec![0.0; n],
                "precipitation_hours": vec![2.0; n],
                "wind_speed_10m_max": vec![9.4; n],
                "shortwave_radiation_sum": vec![24.31; n],
                "sunrise": sunrise,
                "sunset": sunset,
            }
        }))
    }

    fn load_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn dates(n: u64) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2023, 6, 7).unwrap();
        (0..n).map(|i| start + chrono::Days::new(i)).collect()
    }

    #[test]
    fn test_extract_one_row_per_day() {
        let location = Location::default();
        let rows = extract_at(&sample_response(&dates(5)), &location, load_time()).unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].date, "2023-06-07");
        assert_eq!(rows[4].date, "2023-06-11");
        for row in &rows {
            assert_eq!(row.city, "Cleveland");
            assert_eq!(row.zip_code, "37312");
            assert_eq!(row.state, "TN");
            assert_eq!(row.country, "United States");
            assert_eq!(row.load_time, load_time());
            assert_eq!(row.weather_code, Some(3));
            assert_eq!(row.mean_temp, Some(72.5));
        }
    }

    #[test]
    fn test_sunrise_and_sunset_become_time_of_day() {
        let rows =
            extract_at(&sample_response(&dates(1)), &Location::default(), load_time()).unwrap();
        assert_eq!(rows[0].sunrise, "05:45:00");
        assert_eq!(rows[0].sunset, "20:40:00");
    }

    #[test]
    fn test_extract_shares_load_time() {
        let rows = extract(&sample_response(&dates(3)), &Location::default()).unwrap();
        assert!(rows.iter().all(|r| r.load_time == rows[0].load_time));
    }

    #[test]
    fn test_missing_daily_key() {
        let response = RawWeatherResponse(json!({ "error": true, "reason": "out of range" }));
        let err = extract(&response, &Location::default()).unwrap_err();
        assert_eq!(err, MalformedResponseError::MissingField("daily".to_string()));
    }

    #[test]
    fn test_missing_daily_field() {
        let mut response = sample_response(&dates(2));
        response.0["daily"]
            .as_object_mut()
            .unwrap()
            .remove("rain_sum");
        let err = extract(&response, &Location::default()).unwrap_err();
        assert_eq!(
            err,
            MalformedResponseError::MissingField("daily.rain_sum".to_string())
        );
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut response = sample_response(&dates(3));
        response.0["daily"]["snowfall_sum"] = json!([0.0, 0.0]);
        let err = extract(&response, &Location::default()).unwrap_err();
        assert_eq!(
            err,
            MalformedResponseError::LengthMismatch {
                field: "daily.snowfall_sum".to_string(),
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn test_null_measurements_are_kept_as_none() {
        let mut response = sample_response(&dates(2));
        response.0["daily"]["temperature_2m_mean"] = json!([null, 70.0]);
        response.0["daily"]["weather_code"] = json!([null, 61.0]);
        let rows = extract(&response, &Location::default()).unwrap();
        assert_eq!(rows[0].mean_temp, None);
        assert_eq!(rows[0].weather_code, None);
        assert_eq!(rows[1].mean_temp, Some(70.0));
        assert_eq!(rows[1].weather_code, Some(61));
    }

    #[test]
    fn test_unexpected_types() {
        let mut response = sample_response(&dates(1));
        response.0["daily"]["rain_sum"] = json!(["lots"]);
        let err = extract(&response, &Location::default()).unwrap_err();
        assert!(matches!(err, MalformedResponseError::UnexpectedType { .. }));

        let response = RawWeatherResponse(json!({ "daily": [] }));
        let err = extract(&response, &Location::default()).unwrap_err();
        assert!(matches!(err, MalformedResponseError::UnexpectedType { .. }));
    }

    #[test]
    fn test_fractional_weather_code_is_rejected() {
        let mut response = sample_response(&dates(2));
        response.0["daily"]["weather_code"] = json!([3.0, 3.7]);
        let err = extract(&response, &Location::default()).unwrap_err();
        assert_eq!(
            err,
            MalformedResponseError::UnexpectedType {
                field: "daily.weather_code[1]".to_string(),
                expected: "integer or null",
            }
        );
    }

    #[test]
    fn test_sunrise_without_time_part() {
        let mut response = sample_response(&dates(1));
        response.0["daily"]["sunrise"] = json!(["2023-06-07"]);
        let err = extract(&response, &Location::default()).unwrap_err();
        assert_eq!(
            err,
            MalformedResponseError::InvalidTimestamp {
                field: "daily.sunrise[0]".to_string(),
                value: "2023-06-07".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_response_yields_no_rows() {
        let rows = extract(&sample_response(&[]), &Location::default()).unwrap();
        assert!(rows.is_empty());
    }
}
