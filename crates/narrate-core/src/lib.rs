//! Narrate Core - long-form text to a single audiobook file
//!
//! This crate turns text into one continuous WAV narration by driving an
//! external text-to-speech service segment by segment.
//!
//! # Architecture
//!
//! A job flows through four stages:
//! - Sentence-aware segmentation under a character budget
//! - Rate-limited, strictly sequential synthesis with ordered result slots
//! - Decoding of each compressed clip to PCM
//! - Byte-exact WAV concatenation behind one patched header
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use narrate_core::{AudiobookPipeline, AudiobookRequest, Credential, NarrateConfig, OpenAiSynthesizer, Voice};
//!
//! let config = NarrateConfig::default();
//! let synthesizer = Arc::new(OpenAiSynthesizer::from_config(&config));
//! let pipeline = AudiobookPipeline::new(&config, synthesizer)?;
//!
//! let request = AudiobookRequest {
//!     text: "It was a bright cold day in April. The clocks were striking thirteen.".into(),
//!     voice: Voice::Alloy,
//!     credential: Credential::new(api_key),
//!     max_duration: None,
//! };
//! let output = pipeline.run(&request, |event| println!("{:?}", event)).await?;
//! ```

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod synthesis;
pub mod text;

pub use audio::{concatenate, AudioDecoder, AudioSpec, DecodedAudio, OutputFormat, WavHeader};
pub use config::{NarrateConfig, ServerConfig};
pub use engine::{
    AudiobookOutput, AudiobookPipeline, AudiobookRequest, Clock, ProgressEvent,
    RateLimitedScheduler, SchedulerConfig,
};
pub use error::{Error, Result};
pub use synthesis::{Credential, OpenAiSynthesizer, SynthesisResult, Synthesizer, Voice};
pub use text::{extract_text, segment, Segment, Segmenter};
