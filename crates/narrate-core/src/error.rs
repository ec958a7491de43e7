//! Error types for the narration pipeline

use thiserror::Error;

use crate::audio::AudioSpec;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Segment {index} is {length} characters, over the {max_length} character limit")]
    SegmentTooLarge {
        index: usize,
        length: usize,
        max_length: usize,
    },

    #[error("Synthesis failed for segment {index}: {message}")]
    SynthesisFailure {
        index: usize,
        status: Option<u16>,
        message: String,
    },

    #[error("Audio decode error: {0}")]
    DecodeError(String),

    #[error("Format mismatch at clip {index}: expected {expected}, found {found}")]
    FormatMismatch {
        index: usize,
        expected: AudioSpec,
        found: AudioSpec,
    },

    #[error("No audio to concatenate")]
    EmptyAudio,

    #[error("No text to narrate")]
    EmptyText,

    #[error("Audio encoding error: {0}")]
    AudioError(String),

    #[error("Text extraction error: {0}")]
    ExtractionError(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::AudioError(e.to_string())
    }
}

impl From<symphonia::core::errors::Error> for Error {
    fn from(e: symphonia::core::errors::Error) -> Self {
        Error::DecodeError(e.to_string())
    }
}

impl Error {
    /// Upstream HTTP status attached to a synthesis failure, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::SynthesisFailure { status, .. } => *status,
            _ => None,
        }
    }
}
