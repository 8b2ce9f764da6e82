//! Configuration module for recap
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{ChunkingSettings, GeneralSettings, LlmSettings, OutputSettings, Settings};
