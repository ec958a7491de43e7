//! Sentence-aware text segmentation
//!
//! Text is split on the sentence delimiter and sentences are packed greedily
//! into segments of at most `max_length` characters. A sentence is never cut:
//! one that is longer than the budget on its own becomes an oversized segment
//! and is passed through unchanged.

use tracing::{debug, warn};

/// Delimiter between sentences. It is restored between sentences after splitting.
pub const SENTENCE_DELIMITER: &str = ". ";

const DELIMITER_LEN: usize = SENTENCE_DELIMITER.len();

/// A bounded slice of the source text, dispatched as one synthesis unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position in the source text, starting at 0
    pub index: usize,
    pub text: String,
    /// Length of `text` in characters
    pub length: usize,
}

impl Segment {
    /// Whether this segment is over the budget it was cut for.
    pub fn exceeds(&self, max_length: usize) -> bool {
        self.length > max_length
    }
}

/// Splits text into ordered segments under a character budget.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    max_length: usize,
}

impl Segmenter {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Split `text` into segments. Concatenating the segment texts yields `text`
    /// back, except for a whitespace-only tail which is dropped: a trailing
    /// piece with nothing to narrate is never sent to the synthesizer, so
    /// `"Hi. Yo.  "` comes back as `"Hi. Yo. "`.
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        if text.is_empty() {
            return segments;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        let mut sentences = text.split(SENTENCE_DELIMITER).peekable();

        while let Some(sentence) = sentences.next() {
            let is_last = sentences.peek().is_none();
            let piece_len = sentence.chars().count() + if is_last { 0 } else { DELIMITER_LEN };

            if !current.is_empty() && current_len + piece_len > self.max_length {
                self.push(&mut segments, std::mem::take(&mut current), current_len);
                current_len = 0;
            }

            current.push_str(sentence);
            if !is_last {
                current.push_str(SENTENCE_DELIMITER);
            }
            current_len += piece_len;
        }

        if !current.trim().is_empty() {
            self.push(&mut segments, current, current_len);
        }

        debug!(
            "Split {} characters into {} segments (max {})",
            text.chars().count(),
            segments.len(),
            self.max_length
        );
        segments
    }

    fn push(&self, segments: &mut Vec<Segment>, text: String, length: usize) {
        let segment = Segment {
            index: segments.len(),
            text,
            length,
        };
        if segment.exceeds(self.max_length) {
            warn!(
                "Segment {} has a single sentence of {} characters, over the {} limit; passing it through",
                segment.index, segment.length, self.max_length
            );
        }
        segments.push(segment);
    }
}

/// Split `text` into segments of at most `max_length` characters.
pub fn segment(text: &str, max_length: usize) -> Vec<Segment> {
    Segmenter::new(max_length).segment(text)
}
