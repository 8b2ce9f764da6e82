use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::llm::process::{ProcessBackend, ProcessCommand};
use crate::llm::prompts::PromptRequest;

/// Failure of a single model invocation or of a batch of them
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Failed to launch inference command '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Inference command exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Inference command returned empty output")]
    EmptyOutput,

    #[error("Inference timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Inference was cancelled")]
    Cancelled,

    #[error("I/O error while talking to the inference command: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chunk {index} failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: Box<InferenceError>,
    },

    #[error("Inference worker failed: {0}")]
    Worker(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Model output for one chunk, in no guaranteed format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelOutput {
    pub chunk: usize,
    pub text: String,
}

/// Join per-chunk outputs in the order given.
pub fn concat_outputs(outputs: &[RawModelOutput]) -> String {
    outputs
        .iter()
        .map(|o| o.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Runtime knobs for inference calls
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub model: String,
    /// `None` means no limit
    pub timeout: Option<Duration>,
    pub num_ctx: u32,
    pub num_thread: u32,
    pub num_gpu: u32,
    pub max_workers: usize,
}

impl InferenceOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.llm.model.clone(),
            timeout: match settings.llm.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            num_ctx: settings.llm.num_ctx,
            num_thread: settings.llm.num_thread,
            num_gpu: settings.llm.num_gpu,
            max_workers: settings.chunking.max_workers,
        }
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Something that turns a prompt into model text.
///
/// Implementations must return promptly once `cancel` fires and must not
/// leave work running after their future is dropped.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &PromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String, InferenceError>;

    /// Short human-readable description used in logs and debug artifacts.
    fn describe(&self) -> String;
}

/// Build the process backend described by runtime settings.
pub fn build_backend(settings: &Settings) -> Arc<dyn InferenceBackend> {
    let options = InferenceOptions::from_settings(settings);
    let command = if settings.llm.args.is_empty() {
        ProcessCommand::ollama(&settings.llm.command, &options)
    } else {
        ProcessCommand::new(&settings.llm.command, settings.llm.args.clone())
    };
    Arc::new(ProcessBackend::new(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_unbounded() {
        let mut settings = Settings::default();
        settings.llm.timeout_secs = 0;
        assert_eq!(InferenceOptions::from_settings(&settings).timeout, None);

        settings.llm.timeout_secs = 30;
        assert_eq!(
            InferenceOptions::from_settings(&settings).timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn default_backend_runs_ollama() {
        let settings = Settings::default();
        let backend = build_backend(&settings);
        let description = backend.describe();

        assert!(description.starts_with("ollama run"));
        assert!(description.contains(&settings.llm.model));
        assert!(description.contains("--num_ctx 2048"));
    }

    #[test]
    fn custom_args_replace_ollama_flags() {
        let mut settings = Settings::default();
        settings.llm.command = "llama-cli".to_string();
        settings.llm.args = vec!["-m".to_string(), "model.gguf".to_string()];

        assert_eq!(build_backend(&settings).describe(), "llama-cli -m model.gguf");
    }

    #[test]
    fn outputs_concatenate_in_given_order() {
        let outputs = vec![
            RawModelOutput {
                chunk: 0,
                text: "first\n".to_string(),
            },
            RawModelOutput {
                chunk: 1,
                text: "  second".to_string(),
            },
        ];
        assert_eq!(concat_outputs(&outputs), "first\n\nsecond");
    }

    #[test]
    fn errors_describe_their_cause() {
        let err = InferenceError::NonZeroExit {
            code: Some(2),
            stderr: "model not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Inference command exited with status 2: model not found"
        );

        let err = InferenceError::Chunk {
            index: 3,
            source: Box::new(InferenceError::EmptyOutput),
        };
        assert!(err.to_string().contains("Chunk 3 failed"));
    }
}
