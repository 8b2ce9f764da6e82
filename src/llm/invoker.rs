//! Timed, cancellable and bounded-parallel model invocation

use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::llm::artifact::ArtifactWriter;
use crate::llm::client::{InferenceBackend, InferenceError, InferenceOptions, RawModelOutput};
use crate::llm::prompts::PromptRequest;

/// Runs prompts against an [`InferenceBackend`].
///
/// Every call gets the configured timeout. `cancel` stops whatever is in
/// flight at that moment; calls made afterwards start with a fresh token.
pub struct InferenceInvoker {
    backend: Arc<dyn InferenceBackend>,
    options: InferenceOptions,
    artifacts: ArtifactWriter,
    active: Mutex<CancellationToken>,
}

impl InferenceInvoker {
    pub fn new(backend: Arc<dyn InferenceBackend>, options: InferenceOptions) -> Self {
        Self {
            backend,
            options,
            artifacts: ArtifactWriter::disabled(),
            active: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_artifacts(mut self, artifacts: ArtifactWriter) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Cancel all in-flight calls. Safe to call repeatedly or while idle.
    pub fn cancel(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.is_cancelled() {
            tracing::info!("Cancelling in-flight inference");
        }
        active.cancel();
        *active = CancellationToken::new();
    }

    fn current_token(&self) -> CancellationToken {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .child_token()
    }

    /// Run a single prompt.
    pub async fn invoke(&self, prompt: PromptRequest) -> Result<RawModelOutput, InferenceError> {
        let token = self.current_token();
        let call = Call {
            backend: Arc::clone(&self.backend),
            options: self.options.clone(),
            artifacts: self.artifacts.clone(),
        };
        call.run(0, prompt, token).await
    }

    /// Run every prompt with at most `max_workers` calls in flight.
    ///
    /// Results come back in prompt order no matter which call finishes first.
    /// The first failure cancels the remaining calls and is returned as
    /// [`InferenceError::Chunk`]; results of other chunks are discarded.
    pub async fn invoke_all(
        &self,
        prompts: Vec<PromptRequest>,
    ) -> Result<Vec<RawModelOutput>, InferenceError> {
        let total = prompts.len();
        let workers = self.options.max_workers.max(1);
        let batch = self.current_token();
        let permits = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        tracing::info!(
            "Running {} inference calls with up to {} workers",
            total,
            workers
        );

        for (index, prompt) in prompts.into_iter().enumerate() {
            let call = Call {
                backend: Arc::clone(&self.backend),
                options: self.options.clone(),
                artifacts: self.artifacts.clone(),
            };
            let permits = Arc::clone(&permits);
            let token = batch.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = token.cancelled() => return (index, Err(InferenceError::Cancelled)),
                    permit = permits.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (index, Err(InferenceError::Cancelled)),
                    },
                };
                (index, call.run(index, prompt, token).await)
            });
        }

        let mut slots: Vec<Option<RawModelOutput>> = vec![None; total];

        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((index, Ok(output))) => {
                    slots[index] = Some(output);
                    continue;
                }
                Ok((_, Err(InferenceError::Cancelled))) => InferenceError::Cancelled,
                Ok((index, Err(source))) => InferenceError::Chunk {
                    index,
                    source: Box::new(source),
                },
                Err(e) => InferenceError::Worker(e.to_string()),
            };

            tracing::error!("Aborting summary batch: {}", failure);
            batch.cancel();
            tasks.shutdown().await;
            return Err(failure);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| InferenceError::Worker(format!("chunk {} produced no result", index)))
            })
            .collect()
    }
}

/// Everything a single call needs, owned so it can move into a task
struct Call {
    backend: Arc<dyn InferenceBackend>,
    options: InferenceOptions,
    artifacts: ArtifactWriter,
}

impl Call {
    async fn run(
        self,
        index: usize,
        prompt: PromptRequest,
        token: CancellationToken,
    ) -> Result<RawModelOutput, InferenceError> {
        tracing::debug!("Inference for chunk {} started ({})", index, prompt.language());
        let started = std::time::Instant::now();

        let generation = self.backend.generate(&prompt, &token);
        let text = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, generation)
                .await
                .map_err(|_| InferenceError::Timeout(limit))??,
            None => generation.await?,
        };

        tracing::debug!(
            "Inference for chunk {} finished in {:.1}s ({} bytes)",
            index,
            started.elapsed().as_secs_f32(),
            text.len()
        );

        self.artifacts.record(
            index,
            &self.backend.describe(),
            &self.options,
            &prompt,
            &text,
        );

        Ok(RawModelOutput { chunk: index, text })
    }
}
