//! Sentence-aligned chunking with overlap
//!
//! Long transcripts are cut into chunks that fit the model's context. Each
//! chunk after the first repeats a few trailing sentences of its predecessor
//! so that the model keeps some context across the boundary.

use serde::Serialize;

/// A bounded slice of the source text, summarized independently
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Zero-based position in the document
    pub index: usize,

    /// Sentences of this chunk joined by single spaces
    pub text: String,

    pub is_first: bool,
    pub is_last: bool,

    /// Number of leading sentences repeated from the previous chunk
    pub overlap: usize,
}

impl Chunk {
    /// Size in characters, the unit `max_chunk_size` is expressed in
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits text into overlapping chunks of at most `max_chunk_size` characters
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl ChunkSplitter {
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size,
            overlap_size,
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Split `text` into chunks.
    ///
    /// A sentence longer than `max_chunk_size` is never truncated: it gets a
    /// chunk of its own. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let mut groups: Vec<(Vec<&str>, usize)> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_overlap = 0;
        let mut current_size = 0;

        for sentence in split_sentences(text) {
            let len = char_len(sentence);

            if !current.is_empty() && current_size + 1 + len > self.max_chunk_size {
                let closed = std::mem::take(&mut current);
                let mut seed = self.overlap_tail(&closed);
                groups.push((closed, current_overlap));

                // The carried context must not push the new chunk over the limit.
                while !seed.is_empty() && joined_len(&seed) + 1 + len > self.max_chunk_size {
                    seed.remove(0);
                }

                current_overlap = seed.len();
                current_size = joined_len(&seed);
                current = seed;
            }

            current_size = if current.is_empty() {
                len
            } else {
                current_size + 1 + len
            };
            current.push(sentence);
        }

        if !current.is_empty() {
            groups.push((current, current_overlap));
        }

        let total = groups.len();
        let chunks: Vec<Chunk> = groups
            .into_iter()
            .enumerate()
            .map(|(index, (sentences, overlap))| Chunk {
                index,
                text: sentences.join(" "),
                is_first: index == 0,
                is_last: index + 1 == total,
                overlap,
            })
            .collect();

        tracing::debug!(
            "Split {} characters into {} chunks (max {}, overlap {})",
            char_len(text),
            chunks.len(),
            self.max_chunk_size,
            self.overlap_size
        );

        chunks
    }

    /// Trailing sentences of `sentences` whose joined size fits the overlap budget
    fn overlap_tail<'a>(&self, sentences: &[&'a str]) -> Vec<&'a str> {
        let mut size = 0;
        let mut taken = 0;

        for sentence in sentences.iter().rev() {
            let len = char_len(sentence);
            let next = if taken == 0 { len } else { size + 1 + len };
            if next > self.overlap_size {
                break;
            }
            size = next;
            taken += 1;
        }

        sentences[sentences.len() - taken..].to_vec()
    }
}

/// Split text after `.`, `!` or `?` when followed by whitespace.
///
/// Sentences are trimmed and empty ones dropped. Text without these
/// terminators (most CJK prose) comes back as a single sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                let end = i + c.len_utf8();
                push_trimmed(&mut sentences, &text[start..end]);
                start = end;
            }
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn joined_len(sentences: &[&str]) -> usize {
    if sentences.is_empty() {
        return 0;
    }
    sentences.iter().map(|s| char_len(s)).sum::<usize>() + sentences.len() - 1
}
