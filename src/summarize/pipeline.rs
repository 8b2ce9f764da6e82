//! Summarization pipeline orchestration

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::llm::{
    build_backend, concat_outputs, ArtifactWriter, InferenceBackend, InferenceInvoker,
    InferenceOptions, PromptBuilder, ResponseParser,
};
use crate::storage::{OutputFormatter, SummaryRecord};
use crate::text::{Chunk, ChunkSplitter};
use crate::RecapError;

/// Transcript to summarize and where it came from
#[derive(Debug, Clone)]
pub struct SummarizeRequest {
    pub source_text: String,
    pub source_url: String,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct SummarizeResponse {
    pub record: SummaryRecord,
    pub success: bool,
    pub output_path: PathBuf,
}

/// Split, prompt, infer, parse, validate and save.
pub struct SummaryPipeline {
    splitter: ChunkSplitter,
    prompts: PromptBuilder,
    invoker: InferenceInvoker,
    parser: ResponseParser,
    formatter: OutputFormatter,
}

impl SummaryPipeline {
    /// Create a pipeline around any inference backend
    pub fn new(settings: &Settings, backend: Arc<dyn InferenceBackend>) -> Self {
        let artifacts = if settings.output.debug_artifacts {
            ArtifactWriter::new(settings.llm_output_dir())
        } else {
            ArtifactWriter::disabled()
        };

        let invoker = InferenceInvoker::new(backend, InferenceOptions::from_settings(settings))
            .with_artifacts(artifacts);

        Self {
            splitter: ChunkSplitter::new(
                settings.chunking.max_chunk_size,
                settings.chunking.overlap,
            ),
            prompts: PromptBuilder::new(),
            invoker,
            parser: ResponseParser::new(settings.parser.clone()),
            formatter: OutputFormatter::new(settings.output_dir()),
        }
    }

    /// Create a pipeline that runs the configured inference command
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings, build_backend(settings))
    }

    /// Stop in-flight inference; the running `summarize` returns an error.
    pub fn cancel(&self) {
        self.invoker.cancel();
    }

    pub fn chunks(&self, text: &str) -> Vec<Chunk> {
        self.splitter.split(text)
    }

    pub async fn summarize(
        &self,
        request: SummarizeRequest,
    ) -> Result<SummarizeResponse, RecapError> {
        if request.source_text.trim().is_empty() {
            return Err(RecapError::EmptyInput);
        }

        let chunks = self.chunks(&request.source_text);
        tracing::info!(
            "Summarizing {} characters in {} chunks",
            request.source_text.chars().count(),
            chunks.len()
        );

        let prompts = chunks
            .iter()
            .map(|chunk| self.prompts.build_chunk(chunk))
            .collect();

        let outputs = self.invoker.invoke_all(prompts).await?;
        let combined = concat_outputs(&outputs);

        let record = self.parser.parse(&combined);
        if record.is_empty() {
            tracing::warn!("Model output produced an empty summary; saving it anyway");
        }

        self.formatter.check_record(&record)?;

        let formatted = self.formatter.format(record, &request.source_url);
        let output_path = self.formatter.save(&formatted)?;

        Ok(SummarizeResponse {
            record: formatted.content,
            success: true,
            output_path,
        })
    }
}
