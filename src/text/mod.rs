//! Text processing for recap
//!
//! Language detection and sentence-aligned chunking of transcripts.

pub mod chunker;
pub mod language;

pub use chunker::{split_sentences, Chunk, ChunkSplitter};
pub use language::{detect, Language};
