//! Record model
//!
//! A Record is one row of an uploaded sheet plus the identity the store gave it.

use serde::{Deserialize, Serialize};

/// Store-assigned record identity.
pub type RecordId = i64;

/// Number of cells a row must carry to become a Record.
pub const FIELD_COUNT: usize = 10;

/// Attribute fields of a Record, in sheet column order.
///
/// Every field is required when deserializing, so an update body must be a
/// full replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub postal: String,
    pub phone: String,
    pub email: String,
    pub web: String,
}

impl RecordFields {
    /// Maps a decoded row onto the attribute fields.
    ///
    /// Fails when the row has fewer than [`FIELD_COUNT`] cells. Cells past the
    /// last column are ignored.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Result<Self, String> {
        if row.len() < FIELD_COUNT {
            return Err(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                row.len()
            ));
        }

        let cell = |i: usize| row[i].as_ref().to_string();
        Ok(Self {
            first_name: cell(0),
            last_name: cell(1),
            company_name: cell(2),
            address: cell(3),
            city: cell(4),
            county: cell(5),
            postal: cell(6),
            phone: cell(7),
            email: cell(8),
            web: cell(9),
        })
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl Record {
    pub fn new(id: RecordId, fields: RecordFields) -> Self {
        Self { id, fields }
    }
}

#[cfg(test)]
pub(crate) fn sample_fields(tag: &str) -> RecordFields {
    RecordFields {
        first_name: format!("{tag}-first"),
        last_name: format!("{tag}-last"),
        company_name: format!("{tag} Ltd"),
        address: "1 High St".to_string(),
        city: "Leeds".to_string(),
        county: "West Yorkshire".to_string(),
        postal: "LS1 1AA".to_string(),
        phone: "0113 000 0000".to_string(),
        email: format!("{tag}@example.com"),
        web: format!("http://{tag}.example.com"),
    }
}
