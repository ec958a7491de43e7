//! Text-to-speech capability used by the scheduler
//!
//! The pipeline treats synthesis as an opaque service mapping
//! (segment, voice, credential) to compressed audio bytes.

mod openai;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::text::Segment;

pub use openai::OpenAiSynthesizer;

/// Voices offered by the speech service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub fn all() -> &'static [Voice] {
        &[
            Voice::Alloy,
            Voice::Echo,
            Voice::Fable,
            Voice::Onyx,
            Voice::Nova,
            Voice::Shimmer,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Voice::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| Error::ConfigError(format!("Unknown voice: {}", s)))
    }
}

/// API key for the speech service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// One synthesis call, built at dispatch time
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub segment: &'a Segment,
    pub voice: Voice,
    pub credential: &'a Credential,
}

/// Compressed audio returned for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub index: usize,
    pub audio: Bytes,
}

/// External text-to-speech capability
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize one segment into compressed audio.
    ///
    /// # Errors
    /// Returns `Error::SynthesisFailure` on a non-success response; transport
    /// errors may surface as any other variant and are wrapped by the scheduler.
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<Bytes>;
}
