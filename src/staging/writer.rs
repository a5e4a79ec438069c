use crate::staging::error::WriteError;
use crate::types::observation::{DailyObservation, OBSERVATION_COLUMNS};
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Format of the load timestamp column.
pub const LOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn text_column<'a>(
    observations: &'a [DailyObservation],
    field: impl Fn(&'a DailyObservation) -> &'a str,
) -> Vec<&'a str> {
    observations.iter().map(field).collect()
}

fn float_column(
    observations: &[DailyObservation],
    field: impl Fn(&DailyObservation) -> Option<f64>,
) -> Vec<Option<f64>> {
    observations.iter().map(field).collect()
}

/// Lays out observations as a table with the columns of [`OBSERVATION_COLUMNS`].
pub fn observations_to_dataframe(obs: &[DailyObservation]) -> PolarsResult<DataFrame> {
    let load_times: Vec<String> = obs
        .iter()
        .map(|o| o.load_time.format(LOAD_TIME_FORMAT).to_string())
        .collect();
    let weather_codes: Vec<Option<i64>> = obs.iter().map(|o| o.weather_code).collect();

    let [
        date,
        weather_code,
        mean_temp,
        max_temp,
        min_temp,
        precip,
        rain_sum,
        snowfall_sum,
        windspeed_max,
        shortwave_radiation,
        precip_hours,
        city,
        zip_code,
        state,
        country,
        sunrise,
        sunset,
        load_dt,
    ] = OBSERVATION_COLUMNS;

    df!(
        date => text_column(obs, |o| o.date.as_str()),
        weather_code => weather_codes,
        mean_temp => float_column(obs, |o| o.mean_temp),
        max_temp => float_column(obs, |o| o.max_temp),
        min_temp => float_column(obs, |o| o.min_temp),
        precip => float_column(obs, |o| o.precip),
        rain_sum => float_column(obs, |o| o.rain_sum),
        snowfall_sum => float_column(obs, |o| o.snowfall_sum),
        windspeed_max => float_column(obs, |o| o.windspeed_max),
        shortwave_radiation => float_column(obs, |o| o.shortwave_radiation),
        precip_hours => float_column(obs, |o| o.precip_hours),
        city => text_column(obs, |o| o.city.as_str()),
        zip_code => text_column(obs, |o| o.zip_code.as_str()),
        state => text_column(obs, |o| o.state.as_str()),
        country => text_column(obs, |o| o.country.as_str()),
        sunrise => text_column(obs, |o| o.sunrise.as_str()),
        sunset => text_column(obs, |o| o.sunset.as_str()),
        load_dt => load_times,
    )
}

/// Writes observations to `path` as comma-delimited rows without a header,
/// replacing whatever was there. Returns the number of rows written.
pub fn write_observations(
    observations: &[DailyObservation],
    path: &Path,
) -> Result<usize, WriteError> {
    let mut df = observations_to_dataframe(observations).map_err(WriteError::DataFrame)?;
    let mut file = File::create(path).map_err(|e| WriteError::Io(path.to_path_buf(), e))?;

    CsvWriter::new(&mut file)
        .include_header(false)
        .with_separator(b',')
        .finish(&mut df)
        .map_err(|e| WriteError::Csv(path.to_path_buf(), e))?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(df.height())
}
