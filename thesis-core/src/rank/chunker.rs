//! Splitting crawl dumps into chunks and removing repeats.
//!
//! The crawler writes one line per heading or paragraph, blank lines between
//! blocks and a [`PAGE_BREAK`] line between pages. Chunking keeps a heading
//! glued to the paragraph that follows it while never letting a chunk cross
//! a page boundary.

use super::types::{Chunk, PAGE_BREAK};
use std::collections::HashSet;

/// Splits crawler lines into chunks.
///
/// - A page-break line always flushes the accumulated lines.
/// - A blank line flushes only when more than one line has accumulated; a
///   single line before a blank is an orphaned header and is held over.
/// - Whatever remains at the end of input is flushed.
pub fn chunk<I, S>(lines: I) -> Vec<Chunk>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        let stripped = line.trim();

        if stripped == PAGE_BREAK {
            flush(&mut current, &mut chunks);
            continue;
        }

        if stripped.is_empty() {
            if current.len() > 1 {
                flush(&mut current, &mut chunks);
            }
            continue;
        }

        current.push(line.to_string());
    }

    flush(&mut current, &mut chunks);
    chunks
}

fn flush(current: &mut Vec<String>, chunks: &mut Vec<Chunk>) {
    if current.is_empty() {
        return;
    }
    let text = current.join("\n");
    chunks.push(Chunk::new(text.trim()));
    current.clear();
}

/// Removes repeated chunks, keeping the first occurrence of each.
pub fn dedup(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert(chunk.text().to_string()))
        .collect()
}
