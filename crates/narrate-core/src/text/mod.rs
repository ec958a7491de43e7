//! Text preparation: document extraction and segmentation

mod extract;
mod segmenter;

pub use extract::{
    extract_epub, extract_text, filter_unwanted_content, html_to_text, normalize_whitespace,
    SourceKind,
};
pub use segmenter::{segment, Segment, Segmenter, SENTENCE_DELIMITER};
