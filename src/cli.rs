use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;
use weather_etl::{
    BigQueryLoader, Pipeline, PipelineConfig, StagingArea, TokenSource, WeatherFetcher,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-etl",
    version,
    about = "Load daily Open-Meteo weather observations into BigQuery"
)]
pub struct Cli {
    /// TOML configuration file. Built-in defaults are used when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Env file providing PROJECT_ID, DATASET_ID and TABLE_ID.
    /// Defaults to `credentials.env` if present.
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Directory for the staging files; overrides the config file.
    #[arg(long, global = true)]
    pub staging_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-time load of a historical range from the archive API. Replaces table contents.
    Backfill {
        /// First day to load (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day to load, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Days each window reaches past its first day.
        #[arg(long)]
        window_days: Option<u32>,

        /// Seconds to wait between windows.
        #[arg(long)]
        delay_secs: Option<u64>,
    },

    /// Append yesterday's observations from the forecast API.
    Incremental {
        /// Pretend today is this date (YYYY-MM-DD).
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        PipelineConfig::load_env_file(self.env_file.as_deref())?;
        let mut config = PipelineConfig::load(self.config.as_deref())?;
        if let Some(dir) = self.staging_dir {
            config.staging_dir = Some(dir);
        }
        if let Command::Backfill {
            start,
            end,
            window_days,
            delay_secs,
        } = &self.command
        {
            config.backfill.start_date = start.unwrap_or(config.backfill.start_date);
            config.backfill.end_date = end.unwrap_or(config.backfill.end_date);
            config.backfill.window_days = window_days.unwrap_or(config.backfill.window_days);
            config.backfill.delay_secs = delay_secs.unwrap_or(config.backfill.delay_secs);
        }
        config.validate()?;

        let destination = config.warehouse.destination()?;
        let staging = match &config.staging_dir {
            Some(dir) => StagingArea::new(dir.clone()).await?,
            None => StagingArea::in_cache_dir().await?,
        };
        info!(
            "Destination {}, staging in {}",
            destination,
            staging.dir().display()
        );

        let source = WeatherFetcher::new(config.http.settings())?;
        let warehouse = BigQueryLoader::builder()
            .token(TokenSource::resolve(config.warehouse.access_token.clone()))
            .api_base(config.warehouse.api_base.clone())
            .options(config.warehouse.load_options())
            .poll_interval(Duration::from_millis(config.warehouse.poll_interval_ms))
            .build()?;

        let pipeline = Pipeline::builder()
            .source(source)
            .warehouse(warehouse)
            .location(config.location.clone())
            .destination(destination)
            .staging(staging)
            .request_delay(config.request_delay())
            .build();

        let summary = match self.command {
            Command::Backfill { .. } => pipeline
                .backfill()
                .start(config.backfill.start_date)
                .end(config.backfill.end_date)
                .window_days(config.backfill.window_days)
                .call()
                .await
                .context("Backfill aborted")?,
            Command::Incremental { today } => pipeline
                .incremental(today.unwrap_or_else(|| Local::now().date_naive()))
                .await
                .context("Incremental load failed")?,
        };

        info!(
            "Done: {} window(s), {} row(s) loaded",
            summary.windows, summary.rows_loaded
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backfill_args() {
        let cli = Cli::try_parse_from([
            "weather-etl",
            "--config",
            "job.toml",
            "backfill",
            "--start",
            "1991-06-07",
            "--end",
            "1991-07-10",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("job.toml")));
        match cli.command {
            Command::Backfill { start, end, .. } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(1991, 6, 7));
                assert_eq!(end, NaiveDate::from_ymd_opt(1991, 7, 10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_incremental_args() {
        let cli = Cli::try_parse_from(["weather-etl", "incremental", "--today", "2024-03-15"])
            .unwrap();
        match cli.command {
            Command::Incremental { today } => {
                assert_eq!(today, NaiveDate::from_ymd_opt(2024, 3, 15));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_date() {
        let args = ["weather-etl", "incremental", "--today", "15/03/2024"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
