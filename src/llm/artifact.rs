//! Plain-text debug artifacts of inference calls
//!
//! Each successful call leaves a file with the model configuration, the
//! prompt and the raw output. Nothing downstream reads these files, so a
//! failure to write one is only logged.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::llm::client::InferenceOptions;
use crate::llm::prompts::PromptRequest;

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: Option<PathBuf>,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A writer that records nothing
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write the artifact for one call, logging instead of failing.
    pub fn record(
        &self,
        chunk: usize,
        backend: &str,
        options: &InferenceOptions,
        prompt: &PromptRequest,
        output: &str,
    ) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        match write_artifact(dir, chunk, backend, options, prompt, output) {
            Ok(path) => {
                tracing::debug!("LLM output for chunk {} saved to {}", chunk, path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Failed to write LLM debug artifact: {:#}", e);
                None
            }
        }
    }
}

fn write_artifact(
    dir: &Path,
    chunk: usize,
    backend: &str,
    options: &InferenceOptions,
    prompt: &PromptRequest,
    output: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("llm_output_{}_{:03}.txt", timestamp, chunk));

    let timeout = match options.timeout {
        Some(limit) => format!("{} seconds", limit.as_secs()),
        None => "unbounded".to_string(),
    };

    let content = format!(
        "=== Model Configuration ===\n\
         Command: {backend}\n\
         Model: {model}\n\
         Timeout: {timeout}\n\
         Context window: {num_ctx}\n\
         Threads: {num_thread}\n\
         GPU layers: {num_gpu}\n\
         Chunk: {chunk}\n\
         Language: {language}\n\
         \n\
         === Prompt ===\n\
         {prompt}\n\
         \n\
         === Model Output ===\n\
         {output}",
        model = options.model,
        num_ctx = options.num_ctx,
        num_thread = options.num_thread,
        num_gpu = options.num_gpu,
        language = prompt.language(),
        prompt = prompt.body(),
    );

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
