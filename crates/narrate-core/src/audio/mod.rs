//! Audio decoding, WAV encoding and concatenation

mod concat;
mod decoder;
mod encoder;
mod header;
mod parts;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use concat::{concatenate, concatenate_wav, concatenate_with_progress, ConcatProgress};
pub use decoder::AudioDecoder;
pub use encoder::{AudioEncoder, OutputFormat};
pub use header::{WavHeader, WAV_HEADER_LEN};
pub use parts::{group_by_duration, split_into_parts, zip_parts};

/// Sample format shared by every clip of one audiobook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl fmt::Display for AudioSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {} bit",
            self.sample_rate, self.channels, self.bit_depth
        )
    }
}

/// PCM produced by decoding one synthesized clip
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    /// Depth the samples are written at when encoded to WAV
    pub bit_depth: u16,
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn new(spec: AudioSpec, samples: Vec<f32>) -> Self {
        Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bit_depth: spec.bit_depth,
            samples,
        }
    }

    pub fn spec(&self) -> AudioSpec {
        AudioSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bit_depth: self.bit_depth,
        }
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}
