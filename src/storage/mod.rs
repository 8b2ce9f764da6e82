//! Storage module for recap
//!
//! Summary data model and the JSON files summaries are saved to.

mod models;
mod output;

pub use models::{FormattedSummary, Metadata, SummaryRecord, FORMAT_VERSION};
pub use output::{OutputFormatter, ValidationError};
