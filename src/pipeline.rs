//! Drives fetch → extract → stage → load for the two run modes.
//!
//! Windows are processed strictly one after another. The first failing step
//! aborts the whole run; windows loaded before the failure stay loaded.

use crate::error::PipelineError;
use crate::staging::area::StagingArea;
use crate::types::date_window::{windows, DateWindow, MAX_WINDOW_DAYS};
use crate::types::endpoint::Endpoint;
use crate::types::location::Location;
use crate::warehouse::table::{TableRef, WriteMode};
use crate::warehouse::WarehouseLoader;
use crate::weather_data::extractor::extract;
use crate::weather_data::fetcher::WeatherSource;
use bon::bon;
use chrono::NaiveDate;
use log::info;
use std::time::Duration;

/// Pause between backfill windows, to stay polite with the public API.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub windows: usize,
    pub rows_loaded: usize,
}

pub struct Pipeline<S, W> {
    source: S,
    warehouse: W,
    location: Location,
    destination: TableRef,
    staging: StagingArea,
    request_delay: Duration,
}

#[bon]
impl<S: WeatherSource, W: WarehouseLoader> Pipeline<S, W> {
    #[builder]
    pub fn new(
        source: S,
        warehouse: W,
        location: Location,
        destination: TableRef,
        staging: StagingArea,
        #[builder(default = DEFAULT_REQUEST_DELAY)] request_delay: Duration,
    ) -> Self {
        Self {
            source,
            warehouse,
            location,
            destination,
            staging,
            request_delay,
        }
    }

    /// Loads `[start, end]` window by window from the archive endpoint,
    /// replacing the table contents with each window.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use weather_etl::{Pipeline, PipelineError, WeatherSource, WarehouseLoader};
    /// # use chrono::NaiveDate;
    /// # async fn run<S: WeatherSource, W: WarehouseLoader>(
    /// #     pipeline: Pipeline<S, W>,
    /// # ) -> Result<(), PipelineError> {
    /// let summary = pipeline
    ///     .backfill()
    ///     .start(NaiveDate::from_ymd_opt(1991, 6, 7).unwrap())
    ///     .end(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap())
    ///     .call()
    ///     .await?;
    /// println!("{} windows loaded", summary.windows);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn backfill(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        #[builder(default = MAX_WINDOW_DAYS)] window_days: u32,
    ) -> Result<RunSummary, PipelineError> {
        let plan = windows(start, end, window_days)?;
        let total = plan.len();
        info!(
            "Backfilling {} to {} in {} windows for {}",
            start, end, total, self.location.city
        );

        let mut summary = RunSummary::default();
        for (i, window) in plan.enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            info!("Window {}/{}: {}", i + 1, total, window);
            summary.rows_loaded += self
                .run_window(Endpoint::Archive, window, WriteMode::Replace)
                .await?;
            summary.windows += 1;
        }

        info!(
            "Backfill finished: {} windows, {} rows",
            summary.windows, summary.rows_loaded
        );
        Ok(summary)
    }

    /// Appends the day before `today`, taken from the forecast endpoint.
    pub async fn incremental(&self, today: NaiveDate) -> Result<RunSummary, PipelineError> {
        let window = DateWindow::yesterday(today);
        info!("Incremental load for {} ({})", window.start, self.location.city);
        let rows = self
            .run_window(Endpoint::Forecast, window, WriteMode::Append)
            .await?;
        Ok(RunSummary {
            windows: 1,
            rows_loaded: rows,
        })
    }

    async fn run_window(
        &self,
        endpoint: Endpoint,
        window: DateWindow,
        mode: WriteMode,
    ) -> Result<usize, PipelineError> {
        let response = self.source.fetch(endpoint, &self.location, window).await?;
        self.staging.write_raw_response(&response).await?;

        let observations = extract(&response, &self.location)?;
        let (path, rows) = self.staging.stage(observations).await?;

        self.warehouse.load(&path, &self.destination, mode).await?;
        Ok(rows)
    }
}
