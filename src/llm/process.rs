//! External model process backend
//!
//! The prompt is written to the child's stdin and the completion is read
//! from its stdout. The child is spawned with `kill_on_drop`, so whichever
//! way the call ends (success, error, timeout, cancellation or an aborted
//! task) the process does not outlive it.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::llm::client::{InferenceBackend, InferenceError, InferenceOptions};
use crate::llm::prompts::PromptRequest;

/// Program and arguments used to run the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `ollama run <model>` with the context, thread and GPU-layer hints
    pub fn ollama(program: &str, options: &InferenceOptions) -> Self {
        Self::new(
            program,
            vec![
                "run".to_string(),
                options.model.clone(),
                "--num_ctx".to_string(),
                options.num_ctx.to_string(),
                "--num_thread".to_string(),
                options.num_thread.to_string(),
                "--num_gpu".to_string(),
                options.num_gpu.to_string(),
            ],
        )
    }
}

/// Runs each prompt through a fresh child process
pub struct ProcessBackend {
    command: ProcessCommand,
}

impl ProcessBackend {
    pub fn new(command: ProcessCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl InferenceBackend for ProcessBackend {
    async fn generate(
        &self,
        prompt: &PromptRequest,
        cancel: &CancellationToken,
    ) -> Result<String, InferenceError> {
        if cancel.is_cancelled() {
            return Err(InferenceError::Cancelled);
        }

        tracing::debug!("Running: {}", self.describe());

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InferenceError::Launch {
                program: self.command.program.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| InferenceError::Worker("child stdin was not captured".to_string()))?;
        let body = prompt.body().as_bytes().to_vec();

        let feed = async move {
            let result = stdin.write_all(&body).await;
            drop(stdin);
            match result {
                // The model may exit before reading everything; its exit status tells the story.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!("Inference command closed stdin early");
                    Ok(())
                }
                other => other,
            }
        };

        let run = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed?;
            Ok::<_, InferenceError>(output?)
        };

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
            output = run => output?,
        };

        if !output.status.success() {
            return Err(InferenceError::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyOutput);
        }

        Ok(text)
    }

    fn describe(&self) -> String {
        std::iter::once(self.command.program.as_str())
            .chain(self.command.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
