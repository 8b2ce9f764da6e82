//! Application settings management

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::llm::ParserVocabulary;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Inference command and model runtime hints
    #[serde(default)]
    pub llm: LlmSettings,

    /// Transcript splitting and parallelism
    #[serde(default)]
    pub chunking: ChunkingSettings,

    /// Where summaries and debug artifacts go
    #[serde(default)]
    pub output: OutputSettings,

    /// Header vocabulary for parsing model output
    #[serde(default)]
    pub parser: ParserVocabulary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for summaries and debug artifacts
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Program that runs the model
    #[serde(default = "default_llm_command")]
    pub command: String,

    /// Arguments for `command`. Empty means `run <model>` with the ollama flags below.
    #[serde(default)]
    pub args: Vec<String>,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Per-call timeout in seconds (0 = no limit)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Context window size
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,

    /// CPU threads for inference
    #[serde(default = "default_num_thread")]
    pub num_thread: u32,

    /// Layers offloaded to the GPU
    #[serde(default = "default_num_gpu")]
    pub num_gpu: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingSettings {
    /// Maximum chunk size in characters
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Characters of trailing context repeated in the next chunk
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Concurrent inference calls
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Summary directory (default: <data_dir>/output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Debug artifact directory (default: <data_dir>/llm_outputs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output_dir: Option<PathBuf>,

    /// Write prompt and raw output of every inference call
    #[serde(default = "default_true")]
    pub debug_artifacts: bool,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "recap", "recap")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/recap"))
}

fn default_llm_command() -> String {
    "ollama".to_string()
}

fn default_llm_model() -> String {
    "jcai/breeze-7b-32k-instruct-v1_0:f16".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_num_ctx() -> u32 {
    2048
}

fn default_num_thread() -> u32 {
    4
}

fn default_num_gpu() -> u32 {
    1
}

fn default_max_chunk_size() -> usize {
    1500
}

fn default_overlap() -> usize {
    200
}

fn default_max_workers() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            command: default_llm_command(),
            args: Vec::new(),
            model: default_llm_model(),
            timeout_secs: default_timeout_secs(),
            num_ctx: default_num_ctx(),
            num_thread: default_num_thread(),
            num_gpu: default_num_gpu(),
        }
    }
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap: default_overlap(),
            max_workers: default_max_workers(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            llm_output_dir: None,
            debug_artifacts: true,
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut settings = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::info!("No config file found, using defaults");
            Self::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;

        Ok(settings)
    }

    /// Parse a configuration file without applying overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `RECAP_*` overrides looked up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(command) = get("RECAP_LLM_COMMAND") {
            self.llm.command = command;
        }
        if let Some(model) = get("RECAP_MODEL") {
            self.llm.model = model;
        }
        if let Some(value) = get("RECAP_TIMEOUT") {
            self.llm.timeout_secs = parse_env("RECAP_TIMEOUT", &value)?;
        }
        if let Some(value) = get("RECAP_NUM_CTX") {
            self.llm.num_ctx = parse_env("RECAP_NUM_CTX", &value)?;
        }
        if let Some(value) = get("RECAP_NUM_THREAD") {
            self.llm.num_thread = parse_env("RECAP_NUM_THREAD", &value)?;
        }
        if let Some(value) = get("RECAP_NUM_GPU") {
            self.llm.num_gpu = parse_env("RECAP_NUM_GPU", &value)?;
        }
        if let Some(value) = get("RECAP_MAX_CHUNK_SIZE") {
            self.chunking.max_chunk_size = parse_env("RECAP_MAX_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = get("RECAP_CHUNK_OVERLAP") {
            self.chunking.overlap = parse_env("RECAP_CHUNK_OVERLAP", &value)?;
        }
        if let Some(value) = get("RECAP_MAX_WORKERS") {
            self.chunking.max_workers = parse_env("RECAP_MAX_WORKERS", &value)?;
        }
        if let Some(dir) = get("RECAP_OUTPUT_DIR") {
            self.output.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = get("RECAP_LLM_OUTPUT_DIR") {
            self.output.llm_output_dir = Some(PathBuf::from(dir));
        }

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size == 0 {
            bail!("chunking.max_chunk_size must be greater than 0");
        }
        if self.chunking.max_workers == 0 {
            bail!("chunking.max_workers must be greater than 0");
        }
        if self.chunking.overlap >= self.chunking.max_chunk_size {
            bail!(
                "chunking.overlap ({}) must be smaller than chunking.max_chunk_size ({})",
                self.chunking.overlap,
                self.chunking.max_chunk_size
            );
        }
        if self.llm.command.trim().is_empty() {
            bail!("llm.command must not be empty");
        }
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "recap", "recap")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &Path) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory summaries are saved to
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .output_dir
            .clone()
            .unwrap_or_else(|| self.general.data_dir.join("output"))
    }

    /// Directory for debug artifacts
    pub fn llm_output_dir(&self) -> PathBuf {
        self.output
            .llm_output_dir
            .clone()
            .unwrap_or_else(|| self.general.data_dir.join("llm_outputs"))
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", key, value))
}
