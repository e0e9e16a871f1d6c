//! API Module
//!
//! HTTP handlers and routing for the record service.
//!
//! Handlers hold no logic of their own beyond parsing: reads go through
//! [`crate::service::RecordReader`], writes through
//! [`crate::service::WriteCoordinator`], uploads onto the ingestion queue.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
