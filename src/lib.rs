//! Daily weather ETL: pulls Open-Meteo daily aggregates for one location and
//! bulk-loads them into a BigQuery table.
//!
//! A run is either a windowed [backfill](Pipeline::backfill) over a historical
//! range or an [incremental](Pipeline::incremental) load of yesterday's data.

mod config;
mod error;
mod pipeline;
mod staging;
#[cfg(test)]
mod test_server;
mod types;
mod utils;
mod warehouse;
mod weather_data;

pub use config::*;
pub use error::PipelineError;
pub use pipeline::*;

pub use staging::area::{StagingArea, CSV_FILE_NAME, RAW_FILE_NAME};
pub use staging::error::WriteError;
pub use staging::writer::{observations_to_dataframe, write_observations};

pub use types::date_window::*;
pub use types::endpoint::*;
pub use types::location::Location;
pub use types::observation::{DailyObservation, OBSERVATION_COLUMNS};

pub use warehouse::auth::TokenSource;
pub use warehouse::bigquery::{BigQueryLoader, LoadOptions};
pub use warehouse::error::LoadError;
pub use warehouse::table::{TableRef, WriteMode};
pub use warehouse::{LoadOutcome, WarehouseLoader};

pub use weather_data::error::{FetchError, MalformedResponseError};
pub use weather_data::extractor::{extract, extract_at};
pub use weather_data::fetcher::{
    HttpSettings, RawWeatherResponse, RetryPolicy, WeatherFetcher, WeatherSource, DAILY_FIELDS,
};
