//! Represents a file stored in the deduplicating file store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single stored file as the server reports it.
///
/// When two uploads share a content hash the server keeps one payload: the
/// original row carries the shared storage and counts its users via
/// `reference_count`, while duplicate uploads become reference rows pointing
/// back at it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FileRecord {
    /// Server-assigned identifier, opaque to the client.
    pub id: String,

    /// URL the payload can be fetched from.
    pub file: String,

    /// Filename as uploaded by the user.
    pub original_filename: String,

    /// Content type (MIME type).
    pub file_type: String,

    /// Size in bytes.
    pub size: i64,

    /// When the record was created.
    pub uploaded_at: DateTime<Utc>,

    /// Content hash; the server may omit it on reference rows.
    #[serde(default)]
    pub hash: String,

    /// Number of uploads sharing this payload, always >= 1 on originals.
    pub reference_count: u32,

    /// True when this row is a pointer to another record's content.
    pub is_reference: bool,

    /// The original record a reference row points at.
    #[serde(default)]
    pub original_file_id: Option<String>,
}

/// Listing responses come back either as a flat array or as a paginated
/// envelope, depending on server configuration. Accept both.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum FileListing {
    /// DRF-style page: `{count, next, previous, results}`. Only the records
    /// matter to the client.
    Paginated { results: Vec<FileRecord> },
    Flat(Vec<FileRecord>),
}

impl FileListing {
    /// The records themselves, empty when the server reported no results.
    pub fn into_records(self) -> Vec<FileRecord> {
        match self {
            FileListing::Paginated { results, .. } => results,
            FileListing::Flat(records) => records,
        }
    }
}
