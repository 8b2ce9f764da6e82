//! recap - Summarize long transcripts with a local LLM
//!
//! Transcripts are split into overlapping chunks, summarized in parallel by a
//! model running behind an external command, and merged into one structured
//! summary saved as JSON.

pub mod cli;
pub mod config;
pub mod llm;
pub mod storage;
pub mod summarize;
pub mod text;

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::InferenceError;
use crate::storage::ValidationError;

/// Main error type for recap
#[derive(Error, Debug)]
pub enum RecapError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Input text is empty")]
    EmptyInput,

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Invalid summary: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to write {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RecapError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "recap";
