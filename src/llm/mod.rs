//! LLM module for recap
//!
//! Prompt construction, model invocation through an external command,
//! and parsing of whatever the model writes back.

pub mod artifact;
pub mod client;
pub mod invoker;
pub mod ollama;
pub mod parser;
pub mod process;
pub mod prompts;

pub use artifact::ArtifactWriter;
pub use client::{
    build_backend, concat_outputs, InferenceBackend, InferenceError, InferenceOptions,
    RawModelOutput,
};
pub use invoker::InferenceInvoker;
pub use parser::{ParserVocabulary, ResponseParser, SectionHeaders};
pub use process::{ProcessBackend, ProcessCommand};
pub use prompts::{PromptBuilder, PromptRequest};
