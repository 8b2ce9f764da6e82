//! Data models for storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written into every saved summary
pub const FORMAT_VERSION: &str = "1.0";

/// Structured summary extracted from model output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Key points, in the order the model gave them
    pub summary: Vec<String>,

    /// May be empty
    pub conclusion: String,

    pub action_items: Vec<String>,
}

impl SummaryRecord {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.conclusion.is_empty() && self.action_items.is_empty()
    }
}

/// Provenance of a saved summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Where the transcript came from
    pub source_url: String,

    pub generated_at: DateTime<Utc>,

    pub version: String,
}

/// A summary record wrapped with its metadata, as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedSummary {
    pub metadata: Metadata,
    pub content: SummaryRecord,
}

impl FormattedSummary {
    pub fn new(content: SummaryRecord, source_url: impl Into<String>) -> Self {
        Self {
            metadata: Metadata {
                source_url: source_url.into(),
                generated_at: Utc::now(),
                version: FORMAT_VERSION.to_string(),
            },
            content,
        }
    }
}
