//! Bulk loading of staged files into the destination table.

pub mod auth;
pub mod bigquery;
pub mod error;
pub mod table;

use crate::warehouse::error::LoadError;
use crate::warehouse::table::{TableRef, WriteMode};
use async_trait::async_trait;
use std::path::Path;

/// What a finished load job reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub job_id: String,
    pub output_rows: Option<u64>,
}

/// A warehouse able to ingest a comma-delimited staging file.
///
/// `load` returns only once the remote job has finished, successfully or not.
#[async_trait]
pub trait WarehouseLoader: Send + Sync {
    async fn load(
        &self,
        file: &Path,
        destination: &TableRef,
        mode: WriteMode,
    ) -> Result<LoadOutcome, LoadError>;
}
