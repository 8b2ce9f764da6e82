//! Validation and persistence of summaries as JSON files

use chrono::Local;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::{FormattedSummary, SummaryRecord};
use crate::RecapError;

/// A summary that does not have the required shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("summary is not a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{field}' has an empty entry at position {index}")]
    EmptyElement { field: &'static str, index: usize },
}

/// Checks summary shape and writes summaries under one directory
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    output_dir: PathBuf,
}

impl OutputFormatter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Whether `value` has the summary shape. Logs the failed constraint.
    pub fn validate(&self, value: &Value) -> bool {
        match self.check(value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Invalid summary: {}", e);
                false
            }
        }
    }

    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

        for field in ["summary", "conclusion", "action_items"] {
            if !object.contains_key(field) {
                return Err(ValidationError::MissingField(field));
            }
        }

        for field in ["summary", "action_items"] {
            if !object[field].is_array() {
                return Err(ValidationError::WrongType {
                    field,
                    expected: "an array",
                });
            }
        }

        if !object["conclusion"].is_string() {
            return Err(ValidationError::WrongType {
                field: "conclusion",
                expected: "a string",
            });
        }

        Ok(())
    }

    /// Typed check. The field shapes hold by construction, so only blank
    /// list entries can be rejected.
    pub fn check_record(&self, record: &SummaryRecord) -> Result<(), ValidationError> {
        for (field, items) in [
            ("summary", &record.summary),
            ("action_items", &record.action_items),
        ] {
            if let Some(index) = items.iter().position(|item| item.trim().is_empty()) {
                return Err(ValidationError::EmptyElement { field, index });
            }
        }

        Ok(())
    }

    pub fn format(&self, record: SummaryRecord, source_url: &str) -> FormattedSummary {
        FormattedSummary::new(record, source_url)
    }

    /// Write `summary` as pretty JSON and return the file path.
    pub fn save(&self, summary: &FormattedSummary) -> Result<PathBuf, RecapError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| RecapError::Storage {
            path: self.output_dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| RecapError::Other(format!("Failed to serialize summary: {}", e)))?;

        let (path, mut file) = self.create_unique()?;
        file.write_all(json.as_bytes())
            .map_err(|source| RecapError::Storage {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Summary saved to {}", path.display());
        Ok(path)
    }

    /// Create `summary_<timestamp>.json`, or the first free `_N` variant.
    ///
    /// `create_new` makes the existence check and the creation one step, so
    /// concurrent saves never end up with the same file.
    fn create_unique(&self) -> Result<(PathBuf, File), RecapError> {
        let stem = format!("summary_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let mut n = 0;

        loop {
            let name = if n == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, n)
            };
            let path = self.output_dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(source) => return Err(RecapError::Storage { path, source }),
            }
        }
    }
}
