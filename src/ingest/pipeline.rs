//! Ingestion pipeline
//!
//! Turns decoded rows into records through the write coordinator. Bad rows and
//! per-row store failures are counted and logged; the batch always runs to the
//! end of the row stream. Only a file that cannot be opened fails the batch.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::decoder::{DecodeError, RowReceiver};
use crate::models::RecordFields;
use crate::service::WriteCoordinator;

/// Failed rows kept in a summary; the `failed` counter keeps counting past it.
pub const MAX_RECORDED_FAILURES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub reason: String,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    /// Sheet or file the rows came from
    pub source: String,
    pub total_rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
}

impl IngestionSummary {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    fn record_failure(&mut self, row: usize, reason: String) {
        self.failed += 1;
        if self.failures.len() < MAX_RECORDED_FAILURES {
            self.failures.push(RowFailure { row, reason });
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Unreadable(#[from] DecodeError),
}

pub struct IngestionPipeline {
    writer: Arc<WriteCoordinator>,
}

impl IngestionPipeline {
    pub fn new(writer: Arc<WriteCoordinator>) -> Self {
        Self { writer }
    }

    /// Consumes `rows` to the end, creating one record per valid row.
    ///
    /// Re-running over the same file creates duplicate records.
    pub async fn run(
        &self,
        job_id: Uuid,
        source: &str,
        mut rows: RowReceiver,
    ) -> Result<IngestionSummary, IngestError> {
        let mut summary = IngestionSummary::new(source);

        while let Some(item) = rows.recv().await {
            let raw = match item {
                Ok(raw) => raw,
                Err(DecodeError::Row { row, reason }) => {
                    summary.total_rows += 1;
                    warn!(%job_id, row, %reason, "undecodable row skipped");
                    summary.record_failure(row, reason);
                    continue;
                }
                Err(e @ DecodeError::Open { .. }) => return Err(e.into()),
            };
            summary.total_rows += 1;

            let fields = match RecordFields::from_row(&raw.cells) {
                Ok(fields) => fields,
                Err(reason) => {
                    warn!(%job_id, row = raw.row, %reason, "invalid row skipped");
                    summary.record_failure(raw.row, reason);
                    continue;
                }
            };

            match self.writer.create(fields).await {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    error!(%job_id, row = raw.row, error = %e, "row not persisted");
                    summary.record_failure(raw.row, e.to_string());
                }
            }
        }

        info!(
            %job_id,
            source,
            total = summary.total_rows,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "ingestion finished"
        );
        Ok(summary)
    }
}
