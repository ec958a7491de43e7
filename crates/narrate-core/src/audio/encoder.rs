//! PCM encoding to canonical WAV containers

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

use super::{AudioSpec, DecodedAudio};
use crate::error::{Error, Result};

/// Formats the pipeline can hand to a downloader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single WAV file (PCM)
    Wav,
    /// ZIP archive of WAV parts
    Zip,
}

impl OutputFormat {
    /// Get content type for format
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Zip => "application/zip",
        }
    }

    /// Filename offered to the user
    pub fn default_filename(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audiobook.wav",
            OutputFormat::Zip => "audiobook_parts.zip",
        }
    }
}

/// Encoder writing f32 samples as integer PCM WAV with a 44-byte header
pub struct AudioEncoder {
    spec: WavSpec,
}

impl AudioEncoder {
    /// Create an encoder for one sample format.
    ///
    /// Only layouts whose WAV header is the plain 44-byte PCM form are
    /// accepted: 8 or 16 bit, mono or stereo.
    pub fn new(spec: AudioSpec) -> Result<Self> {
        if !matches!(spec.bit_depth, 8 | 16) {
            return Err(Error::AudioError(format!(
                "unsupported bit depth {} (expected 8 or 16)",
                spec.bit_depth
            )));
        }
        if !matches!(spec.channels, 1 | 2) {
            return Err(Error::AudioError(format!(
                "unsupported channel count {} (expected 1 or 2)",
                spec.channels
            )));
        }
        if spec.sample_rate == 0 {
            return Err(Error::AudioError("sample rate must be non-zero".to_string()));
        }

        Ok(Self {
            spec: WavSpec {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
                bits_per_sample: spec.bit_depth,
                sample_format: SampleFormat::Int,
            },
        })
    }

    /// Encode one decoded clip on its own.
    pub fn encode_clip(audio: &DecodedAudio) -> Result<Vec<u8>> {
        Self::new(audio.spec())?.encode_wav(&audio.samples)
    }

    /// Encode interleaved samples to WAV format
    pub fn encode_wav(&self, samples: &[f32]) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut buffer, self.spec)?;

            match self.spec.bits_per_sample {
                8 => {
                    for &sample in samples {
                        writer.write_sample((sample.clamp(-1.0, 1.0) * 127.0) as i8)?;
                    }
                }
                _ => {
                    for &sample in samples {
                        // Convert f32 [-1.0, 1.0] to i16
                        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
                    }
                }
            }

            writer.finalize()?;
        }

        debug!(
            "Encoded {} samples to WAV ({} bytes)",
            samples.len(),
            buffer.get_ref().len()
        );
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{WavHeader, WAV_HEADER_LEN};

    fn spec(channels: u16, bit_depth: u16) -> AudioSpec {
        AudioSpec {
            sample_rate: 24000,
            channels,
            bit_depth,
        }
    }

    #[test]
    fn test_wav_has_canonical_header() {
        let encoder = AudioEncoder::new(spec(1, 16)).unwrap();
        let wav = encoder.encode_wav(&[0.0, 0.5, -0.5, 1.0]).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN + 8);

        let header = WavHeader::unpack(&wav).unwrap();
        assert_eq!(header.data_size, 8);
        assert_eq!(header.riff_size, 44);
        assert_eq!(header.spec(), spec(1, 16));
    }

    #[test]
    fn test_wav_samples_are_quantized() {
        let encoder = AudioEncoder::new(spec(1, 16)).unwrap();
        let wav = encoder.encode_wav(&[1.0, -1.0, 2.0]).unwrap();
        let data = &wav[WAV_HEADER_LEN..];
        assert_eq!(i16::from_le_bytes([data[0], data[1]]), 32767);
        assert_eq!(i16::from_le_bytes([data[2], data[3]]), -32767);
        assert_eq!(i16::from_le_bytes([data[4], data[5]]), 32767);
    }

    #[test]
    fn test_stereo_8bit_header() {
        let encoder = AudioEncoder::new(spec(2, 8)).unwrap();
        let wav = encoder.encode_wav(&[0.0; 6]).unwrap();
        let header = WavHeader::unpack(&wav).unwrap();
        assert_eq!(header.block_align, 2);
        assert_eq!(header.data_size, 6);
    }

    #[test]
    fn test_rejects_layouts_without_plain_header() {
        assert!(AudioEncoder::new(spec(1, 24)).is_err());
        assert!(AudioEncoder::new(spec(6, 16)).is_err());
    }

    #[test]
    fn test_output_format_metadata() {
        assert_eq!(OutputFormat::Wav.content_type(), "audio/wav");
        assert_eq!(OutputFormat::Zip.default_filename(), "audiobook_parts.zip");
    }
}
