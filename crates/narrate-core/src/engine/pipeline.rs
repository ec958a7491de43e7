//! End-to-end audiobook job: segment, synthesize, decode, concatenate.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use super::clock::{Clock, TokioClock};
use super::scheduler::{Progress, RateLimitedScheduler, SchedulerConfig};
use crate::audio::{
    concatenate_with_progress, split_into_parts, zip_parts, AudioDecoder, ConcatProgress,
    OutputFormat,
};
use crate::config::NarrateConfig;
use crate::error::{Error, Result};
use crate::synthesis::{Credential, SynthesisResult, Synthesizer, Voice};
use crate::text::{Segment, Segmenter};

/// Observable milestones of one job, for any presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Segmented { segments: usize },
    Synthesized(Progress),
    Decoded { clips: usize },
    Concatenating(ConcatProgress),
    Finished { bytes: usize, parts: usize },
}

/// Everything needed to narrate one text
#[derive(Debug, Clone)]
pub struct AudiobookRequest {
    pub text: String,
    pub voice: Voice,
    pub credential: Credential,
    /// Split the output into parts no longer than this
    pub max_duration: Option<Duration>,
}

/// Final artifact handed to the downloader
#[derive(Debug, Clone)]
pub struct AudiobookOutput {
    pub bytes: Bytes,
    pub format: OutputFormat,
    pub parts: usize,
}

impl AudiobookOutput {
    pub fn filename(&self) -> &'static str {
        self.format.default_filename()
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Orchestrates segmentation, paced synthesis and assembly for a job.
pub struct AudiobookPipeline<S: ?Sized, C = TokioClock> {
    segmenter: Segmenter,
    scheduler: RateLimitedScheduler<C>,
    decoder: AudioDecoder,
    synthesizer: Arc<S>,
}

impl<S: Synthesizer + ?Sized> AudiobookPipeline<S, TokioClock> {
    pub fn new(config: &NarrateConfig, synthesizer: Arc<S>) -> Result<Self> {
        Self::with_clock(config, synthesizer, TokioClock)
    }
}

impl<S: Synthesizer + ?Sized, C: Clock> AudiobookPipeline<S, C> {
    pub fn with_clock(config: &NarrateConfig, synthesizer: Arc<S>, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            segmenter: Segmenter::new(config.max_segment_length),
            scheduler: RateLimitedScheduler::with_clock(
                SchedulerConfig {
                    rate_limit_per_minute: config.rate_limit_per_minute,
                },
                clock,
            ),
            decoder: AudioDecoder::new(),
            synthesizer,
        })
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn decoder(&self) -> &AudioDecoder {
        &self.decoder
    }

    /// Split text into segments, rejecting text with nothing to narrate.
    pub fn segment(&self, text: &str) -> Result<Vec<Segment>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        Ok(self.segmenter.segment(text))
    }

    /// Validate a job's inputs and segment its text. Nothing has been sent
    /// to the synthesizer when this fails.
    pub fn prepare(&self, text: &str, max_duration: Option<Duration>) -> Result<Vec<Segment>> {
        check_max_duration(max_duration)?;
        self.segment(text)
    }

    /// Run every segment through the synthesizer under the rate limit.
    ///
    /// A rejection of an oversized segment is reported as `SegmentTooLarge`.
    pub async fn synthesize<F>(
        &self,
        segments: &[Segment],
        voice: Voice,
        credential: &Credential,
        mut on_event: F,
    ) -> Result<Vec<SynthesisResult>>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        let max_length = self.segmenter.max_length();
        self.scheduler
            .run(
                segments,
                voice,
                credential,
                self.synthesizer.as_ref(),
                |p| on_event(ProgressEvent::Synthesized(p)),
            )
            .await
            .map_err(|err| match err {
                Error::SynthesisFailure {
                    index,
                    status: Some(400 | 413),
                    ..
                } => match segments.iter().find(|s| s.index == index) {
                    Some(s) if s.exceeds(max_length) => Error::SegmentTooLarge {
                        index,
                        length: s.length,
                        max_length,
                    },
                    _ => err,
                },
                other => other,
            })
    }

    /// Narrate a whole text. Either every segment makes it into the output
    /// or the job fails; there is no partial audiobook.
    pub async fn run<F>(&self, request: &AudiobookRequest, mut on_event: F) -> Result<AudiobookOutput>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        async {
            let segments = self.prepare(&request.text, request.max_duration)?;
            info!(
                "Narrating {} characters in {} segments",
                request.text.chars().count(),
                segments.len()
            );
            on_event(ProgressEvent::Segmented {
                segments: segments.len(),
            });

            let results = self
                .synthesize(&segments, request.voice, &request.credential, &mut on_event)
                .await?;

            assemble(&self.decoder, &results, request.max_duration, on_event)
        }
        .instrument(job_span(request.voice))
        .await
    }
}

/// Tracing span that tags every log line of one job with a fresh id.
pub fn job_span(voice: Voice) -> Span {
    info_span!("job", id = %Uuid::new_v4(), voice = %voice)
}

fn check_max_duration(max_duration: Option<Duration>) -> Result<()> {
    if max_duration == Some(Duration::ZERO) {
        return Err(Error::ConfigError(
            "max_duration must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Decode synthesized clips and build the downloadable artifact.
///
/// Without `max_duration` the result is a single WAV file. With it, clips
/// are grouped into duration-limited parts; more than one part is packaged
/// as a ZIP archive.
pub fn assemble<F>(
    decoder: &AudioDecoder,
    results: &[SynthesisResult],
    max_duration: Option<Duration>,
    mut on_event: F,
) -> Result<AudiobookOutput>
where
    F: FnMut(ProgressEvent),
{
    check_max_duration(max_duration)?;

    let decoded = results
        .iter()
        .map(|r| {
            decoder.decode(&r.audio).map_err(|e| match e {
                Error::DecodeError(msg) => {
                    Error::DecodeError(format!("segment {}: {}", r.index, msg))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if decoded.is_empty() {
        return Err(Error::EmptyAudio);
    }
    on_event(ProgressEvent::Decoded {
        clips: decoded.len(),
    });

    let mut parts = match max_duration {
        None => vec![concatenate_with_progress(&decoded, |p| {
            on_event(ProgressEvent::Concatenating(p))
        })?],
        Some(limit) => split_into_parts(&decoded, limit)?,
    };

    let output = if parts.len() == 1 {
        AudiobookOutput {
            bytes: Bytes::from(parts.remove(0)),
            format: OutputFormat::Wav,
            parts: 1,
        }
    } else {
        AudiobookOutput {
            bytes: Bytes::from(zip_parts(&parts)?),
            format: OutputFormat::Zip,
            parts: parts.len(),
        }
    };

    info!(
        "Audiobook ready: {} bytes in {} part(s)",
        output.bytes.len(),
        output.parts
    );
    on_event(ProgressEvent::Finished {
        bytes: output.bytes.len(),
        parts: output.parts,
    });
    Ok(output)
}
