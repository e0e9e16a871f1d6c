//! Bulk ingestion
//!
//! An upload becomes an [`IngestJob`] on a bounded queue. A worker decodes the
//! file on a blocking thread, feeds the rows through [`IngestionPipeline`], and
//! records the outcome in the [`JobRegistry`].

pub mod decoder;
pub mod jobs;
pub mod pipeline;
pub mod worker;

pub use decoder::{spawn_decoder, DecodeError, FileFormat, RawRow};
pub use jobs::{JobRegistry, JobState, JobStatus};
pub use pipeline::{IngestError, IngestionPipeline, IngestionSummary, RowFailure};
pub use worker::{spawn_ingest_workers, IngestJob, IngestQueue, WorkerPool};
