//! Request DTOs for the record API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use super::record::RecordFields;

/// Request body for PUT /records/:id
///
/// A full replacement of the attribute fields; a missing field fails
/// deserialization. An `id` in the body is ignored, the path decides which
/// record is updated.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRecordRequest {
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl UpdateRecordRequest {
    pub fn into_fields(self) -> RecordFields {
        self.fields
    }
}
