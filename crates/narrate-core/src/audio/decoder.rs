//! Compressed audio decoding via symphonia

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::{AudioSpec, DecodedAudio};
use crate::error::{Error, Result};

/// Depth used for clips whose codec does not declare one (MP3, AAC, Vorbis)
const DEFAULT_BIT_DEPTH: u16 = 16;

/// Decodes any container symphonia can probe (MP3, WAV, FLAC, AAC, Ogg) to PCM
#[derive(Debug, Clone, Default)]
pub struct AudioDecoder {
    extension: Option<String>,
}

impl AudioDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that hints the probe with a file extension such as `mp3`.
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: Some(extension.into()),
        }
    }

    /// Decode a whole container held in memory.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = &self.extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        // Find the first audio track with a known (decodeable) codec.
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::DecodeError("no supported audio track".to_string()))?;

        let track_id = track.id;
        let params = track.codec_params.clone();
        let mut decoder =
            symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;
        let mut sample_rate = params.sample_rate;
        let mut channels = params.channels.map(|c| c.count() as u16);

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(Error::DecodeError(
                        "stream changed parameters mid-clip".to_string(),
                    ))
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count() as u16);

                    let needed = decoded.capacity() * spec.channels.count();
                    if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
                        sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                // A dropped frame would leave a gap in the narration.
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Undecodable packet at ts {}: {}", packet.ts(), e);
                    return Err(Error::DecodeError(format!("corrupt packet: {}", e)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (sample_rate, channels) = match (sample_rate, channels) {
            (Some(rate), Some(ch)) if rate > 0 && ch > 0 => (rate, ch),
            _ => {
                return Err(Error::DecodeError(
                    "stream did not declare a sample rate and channel layout".to_string(),
                ))
            }
        };

        if samples.is_empty() {
            return Err(Error::DecodeError(format!(
                "no samples decoded from {} bytes",
                bytes.len()
            )));
        }

        let bit_depth = match params.bits_per_sample {
            Some(8) => 8,
            _ => DEFAULT_BIT_DEPTH,
        };

        debug!(
            "Decoded {} samples ({} Hz, {} ch) from {} bytes",
            samples.len(),
            sample_rate,
            channels,
            bytes.len()
        );

        Ok(DecodedAudio::new(
            AudioSpec {
                sample_rate,
                channels,
                bit_depth,
            },
            samples,
        ))
    }
}
