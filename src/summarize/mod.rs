//! Summarization module for recap
//!
//! Ties chunking, inference, parsing and storage into one request/response flow.

mod pipeline;

pub use pipeline::{SummarizeRequest, SummarizeResponse, SummaryPipeline};
