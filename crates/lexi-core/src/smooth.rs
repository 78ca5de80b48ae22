//! Word chunking for smoothed streaming.
//!
//! Upstream deltas arrive in arbitrary fragments ("Hel", "lo wor", "ld").
//! [`WordChunker`] re-cuts them into whole words with their trailing
//! whitespace so the server can release one word per tick.

#[derive(Debug, Default)]
pub struct WordChunker {
    buffer: String,
}

impl WordChunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment and take every complete word chunk now available.
    ///
    /// A chunk is any leading whitespace, a run of non-whitespace, and the
    /// whitespace run that follows it. A word with no whitespace after it
    /// yet stays buffered.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);

        let mut chunks = Vec::new();
        while let Some(end) = first_chunk_end(&self.buffer) {
            let rest = self.buffer.split_off(end);
            chunks.push(std::mem::replace(&mut self.buffer, rest));
        }
        chunks
    }

    /// Whatever is left once upstream is finished
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Byte offset where the first complete chunk ends, if there is one.
fn first_chunk_end(text: &str) -> Option<usize> {
    let mut seen_word = false;
    let mut in_trailing_space = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if seen_word {
                in_trailing_space = true;
            }
        } else if in_trailing_space {
            return Some(idx);
        } else {
            seen_word = true;
        }
    }

    if in_trailing_space {
        Some(text.len())
    } else {
        None
    }
}
