//! BigQuery load jobs over the REST API.
//!
//! The staging file is sent with the job configuration in a single
//! `multipart/related` upload, then the job is polled until BigQuery reports
//! it as `DONE`. There is no overall timeout on the wait.

use crate::warehouse::auth::TokenSource;
use crate::warehouse::error::LoadError;
use crate::warehouse::table::{TableRef, WriteMode};
use crate::warehouse::{LoadOutcome, WarehouseLoader};
use async_trait::async_trait;
use bon::{bon, Builder};
use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://bigquery.googleapis.com";

const MULTIPART_BOUNDARY: &str = "weather_etl_load_job_boundary";
const STATE_DONE: &str = "DONE";

/// CSV settings sent with every load job.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct LoadOptions {
    /// Rows skipped at the top of the file. The staging file has no header.
    #[builder(default = 0)]
    pub skip_leading_rows: u32,
    #[builder(default = true)]
    pub autodetect: bool,
    #[builder(default = ',')]
    pub field_delimiter: char,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobRequest {
    configuration: JobConfiguration,
}

#[derive(Debug, Serialize)]
struct JobConfiguration {
    load: LoadConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadConfiguration {
    destination_table: TableReference,
    source_format: &'static str,
    write_disposition: &'static str,
    skip_leading_rows: u32,
    autodetect: bool,
    field_delimiter: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TableReference {
    project_id: String,
    dataset_id: String,
    table_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    job_reference: JobReference,
    status: Option<JobStatus>,
    statistics: Option<JobStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    error_result: Option<ErrorProto>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    reason: Option<String>,
    message: Option<String>,
}

impl ErrorProto {
    fn describe(&self) -> String {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => format!("{reason}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(reason), None) => reason.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobStatistics {
    load: Option<LoadStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadStatistics {
    // int64 values are sent as JSON strings.
    output_rows: Option<String>,
}

impl Job {
    fn is_done(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == STATE_DONE)
    }

    /// Converts a finished job into its outcome, surfacing BigQuery's diagnostics on failure.
    fn into_outcome(self) -> Result<LoadOutcome, LoadError> {
        if let Some(status) = &self.status {
            if let Some(error_result) = &status.error_result {
                let mut message = error_result.describe();
                let details: Vec<String> = status
                    .errors
                    .iter()
                    .map(ErrorProto::describe)
                    .filter(|d| *d != message)
                    .collect();
                if !details.is_empty() {
                    message = format!("{message} ({})", details.join("; "));
                }
                return Err(LoadError::JobFailed {
                    job_id: self.job_reference.job_id,
                    message,
                });
            }
        }

        let output_rows = self
            .statistics
            .and_then(|s| s.load)
            .and_then(|l| l.output_rows)
            .and_then(|rows| rows.parse().ok());
        Ok(LoadOutcome {
            job_id: self.job_reference.job_id,
            output_rows,
        })
    }
}

fn job_request(destination: &TableRef, mode: WriteMode, options: &LoadOptions) -> JobRequest {
    JobRequest {
        configuration: JobConfiguration {
            load: LoadConfiguration {
                destination_table: TableReference {
                    project_id: destination.project_id.clone(),
                    dataset_id: destination.dataset_id.clone(),
                    table_id: destination.table_id.clone(),
                },
                source_format: "CSV",
                write_disposition: mode.write_disposition(),
                skip_leading_rows: options.skip_leading_rows,
                autodetect: options.autodetect,
                field_delimiter: options.field_delimiter.to_string(),
            },
        },
    }
}

/// Job metadata part followed by the raw file part.
fn multipart_related_body(metadata: &[u8], data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + data.len() + 256);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

async fn read_job(response: Response, url: &str) -> Result<Job, LoadError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("HTTP error for {}: {}", url, status);
        return Err(LoadError::HttpStatus {
            url: url.to_string(),
            status,
            body,
        });
    }
    response
        .json::<Job>()
        .await
        .map_err(|e| LoadError::Decode(url.to_string(), e))
}

pub struct BigQueryLoader {
    http: Client,
    token: TokenSource,
    api_base: String,
    options: LoadOptions,
    poll_interval: Duration,
}

#[bon]
impl BigQueryLoader {
    #[builder]
    pub fn new(
        token: TokenSource,
        #[builder(into, default = DEFAULT_API_BASE.to_string())] api_base: String,
        #[builder(default)] options: LoadOptions,
        #[builder(default = Duration::from_secs(1))] poll_interval: Duration,
    ) -> Result<Self, LoadError> {
        let http = Client::builder().build().map_err(LoadError::ClientBuild)?;
        Ok(Self {
            http,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
            options,
            poll_interval,
        })
    }

    async fn submit(
        &self,
        token: &str,
        destination: &TableRef,
        mode: WriteMode,
        data: Vec<u8>,
    ) -> Result<Job, LoadError> {
        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs?uploadType=multipart",
            self.api_base, destination.project_id
        );
        let metadata = serde_json::to_vec(&job_request(destination, mode, &self.options))?;
        let body = multipart_related_body(&metadata, &data);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| LoadError::NetworkRequest(url.clone(), e))?;
        read_job(response, &url).await
    }

    /// Polls the job until it reaches `DONE`.
    ///
    /// A poll rejected with 401 gets one retry with a freshly fetched token, so a
    /// job may outlive the token it was submitted with.
    async fn wait_for(
        &self,
        mut token: String,
        project_id: &str,
        mut job: Job,
    ) -> Result<Job, LoadError> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.api_base, project_id, job.job_reference.job_id
        );
        let location = job.job_reference.location.clone();
        let mut refreshed = false;
        while !job.is_done() {
            if !refreshed {
                tokio::time::sleep(self.poll_interval).await;
            }
            match self.poll(&url, &token, location.as_deref()).await {
                Err(LoadError::HttpStatus { status, .. })
                    if status == StatusCode::UNAUTHORIZED && !refreshed =>
                {
                    warn!(
                        "Access token rejected while polling job {}, refreshing",
                        job.job_reference.job_id
                    );
                    token = self.token.access_token().await?;
                    refreshed = true;
                }
                result => {
                    job = result?;
                    refreshed = false;
                    debug!(
                        "Load job {} state: {}",
                        job.job_reference.job_id,
                        job.status.as_ref().map_or("UNKNOWN", |s| s.state.as_str())
                    );
                }
            }
        }
        Ok(job)
    }

    async fn poll(
        &self,
        url: &str,
        token: &str,
        location: Option<&str>,
    ) -> Result<Job, LoadError> {
        let mut request = self.http.get(url).bearer_auth(token);
        if let Some(location) = location {
            request = request.query(&[("location", location)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| LoadError::NetworkRequest(url.to_string(), e))?;
        read_job(response, url).await
    }
}

#[async_trait]
impl WarehouseLoader for BigQueryLoader {
    async fn load(
        &self,
        file: &Path,
        destination: &TableRef,
        mode: WriteMode,
    ) -> Result<LoadOutcome, LoadError> {
        let data = tokio::fs::read(file)
            .await
            .map_err(|e| LoadError::StagingRead(file.to_path_buf(), e))?;
        let token = self.token.access_token().await?;

        info!("Loading data into {} ({} mode)...", destination, mode);
        let job = self.submit(&token, destination, mode, data).await?;
        info!("Load job {} submitted", job.job_reference.job_id);

        let job = self.wait_for(token, &destination.project_id, job).await?;
        let outcome = job.into_outcome()?;
        info!(
            "Finished loading data into {} (job {}, {} rows)",
            destination,
            outcome.job_id,
            outcome
                .output_rows
                .map_or_else(|| "unknown".to_string(), |r| r.to_string())
        );
        Ok(outcome)
    }
}
