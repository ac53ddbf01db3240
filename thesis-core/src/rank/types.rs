use std::fmt;

/// Literal line the crawler writes between two pages of one site.
pub const PAGE_BREAK: &str = "---PAGE BREAK---";

/// A contiguous block of crawled text treated as one ranking unit.
///
/// Chunks are immutable once produced and compare by their text, which is
/// also the deduplication key.
///
/// # Example
///
/// ```
/// # use thesis_core::rank::Chunk;
/// let chunk = Chunk::new("Our Focus\nWe invest in niche industrial distributors.");
/// assert_eq!(chunk.word_count(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    text: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// A chunk together with its ranking score.
///
/// The score is cosine similarity plus any keyword boost. It is not a
/// probability; only the relative order of scores within one ranking matters.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Joins ranked chunks into the context block handed to a prompt.
pub fn join_chunks(ranked: &[ScoredChunk]) -> String {
    ranked
        .iter()
        .map(|scored| scored.chunk.text())
        .collect::<Vec<_>>()
        .join("\n\n")
}
