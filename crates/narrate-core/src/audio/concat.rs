//! Byte-exact WAV concatenation
//!
//! Every clip is encoded to a canonical WAV container, then the data chunks
//! are appended behind a single header taken from the first clip with its two
//! size fields rewritten. No resampling or mixing happens here.

use tracing::{debug, info};

use super::{AudioEncoder, AudioSpec, DecodedAudio, WavHeader, WAV_HEADER_LEN};
use crate::error::{Error, Result};

/// Running write position while assembling the output container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatProgress {
    pub written: usize,
    pub total: usize,
}

/// Concatenate decoded clips into one WAV container.
pub fn concatenate(decoded: &[DecodedAudio]) -> Result<Vec<u8>> {
    concatenate_with_progress(decoded, |_| {})
}

/// Concatenate decoded clips, reporting the write offset after each clip.
///
/// Fails with `FormatMismatch` before encoding anything when the clips do not
/// share sample rate, channel count and bit depth.
pub fn concatenate_with_progress<F>(decoded: &[DecodedAudio], on_progress: F) -> Result<Vec<u8>>
where
    F: FnMut(ConcatProgress),
{
    let first = decoded.first().ok_or(Error::EmptyAudio)?;
    ensure_uniform(decoded.iter().map(DecodedAudio::spec))?;

    let encoder = AudioEncoder::new(first.spec())?;
    let encoded = decoded
        .iter()
        .map(|clip| encoder.encode_wav(&clip.samples))
        .collect::<Result<Vec<_>>>()?;

    concatenate_wav(&encoded, on_progress)
}

/// Concatenate canonical 44-byte-header WAV containers.
///
/// The output is `44 + Σ(len_i - 44)` bytes: the first container's header
/// with riff size `36 + data` and data size `data`, followed by each
/// container's data chunk in order.
pub fn concatenate_wav<B, F>(containers: &[B], mut on_progress: F) -> Result<Vec<u8>>
where
    B: AsRef<[u8]>,
    F: FnMut(ConcatProgress),
{
    if containers.is_empty() {
        return Err(Error::EmptyAudio);
    }

    let headers = containers
        .iter()
        .map(|c| WavHeader::unpack(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    ensure_uniform(headers.iter().map(WavHeader::spec))?;

    let data_len: usize = containers
        .iter()
        .map(|c| c.as_ref().len() - WAV_HEADER_LEN)
        .sum();
    let data_size = u32::try_from(data_len).map_err(|_| {
        Error::AudioError(format!("{} bytes of audio exceed the WAV size limit", data_len))
    })?;

    let mut header = headers[0];
    header.set_data_size(data_size)?;

    let total = WAV_HEADER_LEN + data_len;
    let mut output = Vec::with_capacity(total);
    output.extend_from_slice(&header.pack());
    on_progress(ConcatProgress {
        written: output.len(),
        total,
    });

    for container in containers {
        output.extend_from_slice(&container.as_ref()[WAV_HEADER_LEN..]);
        on_progress(ConcatProgress {
            written: output.len(),
            total,
        });
    }

    debug!(
        "Individual container sizes: {:?}",
        containers.iter().map(|c| c.as_ref().len()).collect::<Vec<_>>()
    );
    info!(
        "Concatenated {} clips into {} bytes",
        containers.len(),
        output.len()
    );
    Ok(output)
}

fn ensure_uniform(specs: impl Iterator<Item = AudioSpec>) -> Result<()> {
    let mut expected = None;
    for (index, found) in specs.enumerate() {
        match expected {
            None => expected = Some(found),
            Some(expected) if expected != found => {
                return Err(Error::FormatMismatch {
                    index,
                    expected,
                    found,
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(sample_rate: u32) -> AudioSpec {
        AudioSpec {
            sample_rate,
            channels: 1,
            bit_depth: 16,
        }
    }

    fn wav_with_data(data: &[u8]) -> Vec<u8> {
        let mut wav = WavHeader::new(spec(24000), data.len() as u32)
            .unwrap()
            .pack()
            .to_vec();
        wav.extend_from_slice(data);
        wav
    }

    fn clip(sample_rate: u32, samples: Vec<f32>) -> DecodedAudio {
        DecodedAudio::new(spec(sample_rate), samples)
    }

    #[test]
    fn test_two_containers_sum_data_and_patch_header() {
        let a = wav_with_data(&[1u8; 100]);
        let b = wav_with_data(&[2u8; 50]);

        let out = concatenate_wav(&[a, b], |_| {}).unwrap();
        assert_eq!(out.len(), 44 + 150);

        let header = WavHeader::unpack(&out).unwrap();
        assert_eq!(header.riff_size, 186);
        assert_eq!(header.data_size, 150);
        assert_eq!(&out[4..8], &186u32.to_le_bytes());
        assert_eq!(&out[40..44], &150u32.to_le_bytes());
        assert!(out[44..144].iter().all(|&b| b == 1));
        assert!(out[144..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_single_clip_matches_direct_encoding() {
        let audio = clip(24000, vec![0.1, -0.2, 0.3, -0.4, 0.5]);
        let direct = AudioEncoder::encode_clip(&audio).unwrap();
        let merged = concatenate(std::slice::from_ref(&audio)).unwrap();
        assert_eq!(merged, direct);
    }

    #[test]
    fn test_data_length_is_sum_of_inputs() {
        let clips: Vec<DecodedAudio> = (1..=4).map(|n| clip(24000, vec![0.25; n * 10])).collect();
        let out = concatenate(&clips).unwrap();
        let expected_data = (10 + 20 + 30 + 40) * 2;
        assert_eq!(out.len(), WAV_HEADER_LEN + expected_data);
        let header = WavHeader::unpack(&out).unwrap();
        assert_eq!(header.data_size as usize, expected_data);
        assert_eq!(header.riff_size as usize, 36 + expected_data);
    }

    #[test]
    fn test_clip_order_is_preserved() {
        let out = concatenate(&[clip(24000, vec![1.0]), clip(24000, vec![-1.0])]).unwrap();
        let first = i16::from_le_bytes([out[44], out[45]]);
        let second = i16::from_le_bytes([out[46], out[47]]);
        assert_eq!((first, second), (32767, -32767));
    }

    #[test]
    fn test_mismatched_sample_rate_fails_without_output() {
        let mut reported = Vec::new();
        let result = concatenate_with_progress(
            &[clip(24000, vec![0.0; 4]), clip(44100, vec![0.0; 4])],
            |p| reported.push(p),
        );
        match result {
            Err(Error::FormatMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(expected.sample_rate, 24000);
                assert_eq!(found.sample_rate, 44100);
            }
            other => panic!("expected FormatMismatch, got {:?}", other),
        }
        assert!(reported.is_empty());
    }

    #[test]
    fn test_mismatched_channel_count_fails() {
        let stereo = AudioSpec {
            channels: 2,
            ..spec(24000)
        };
        let clips = [
            clip(24000, vec![0.0; 4]),
            clip(24000, vec![0.0; 4]),
            DecodedAudio::new(stereo, vec![0.0; 8]),
        ];
        match concatenate(&clips) {
            Err(Error::FormatMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 2);
                assert_eq!(expected.channels, 1);
                assert_eq!(found.channels, 2);
            }
            other => panic!("expected FormatMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_bit_depth_fails() {
        let eight_bit = AudioSpec {
            bit_depth: 8,
            ..spec(24000)
        };
        let mut reported = Vec::new();
        let result = concatenate_with_progress(
            &[clip(24000, vec![0.0; 4]), DecodedAudio::new(eight_bit, vec![0.0; 4])],
            |p| reported.push(p),
        );
        match result {
            Err(Error::FormatMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(expected.bit_depth, 16);
                assert_eq!(found.bit_depth, 8);
            }
            other => panic!("expected FormatMismatch, got {:?}", other),
        }
        assert!(reported.is_empty());
    }

    #[test]
    fn test_mismatched_container_headers_fail() {
        let a = wav_with_data(&[0u8; 10]);
        let mut b = WavHeader::new(
            AudioSpec {
                bit_depth: 8,
                ..spec(24000)
            },
            10,
        )
        .unwrap()
        .pack()
        .to_vec();
        b.extend_from_slice(&[0u8; 10]);

        let result = concatenate_wav(&[a, b], |_| {});
        assert!(matches!(result, Err(Error::FormatMismatch { index: 1, .. })));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(concatenate(&[]), Err(Error::EmptyAudio)));
    }

    #[test]
    fn test_progress_reaches_total() {
        let a = wav_with_data(&[0u8; 10]);
        let b = wav_with_data(&[0u8; 30]);
        let mut reported = Vec::new();
        concatenate_wav(&[a, b], |p| reported.push(p)).unwrap();
        let written: Vec<usize> = reported.iter().map(|p| p.written).collect();
        assert_eq!(written, vec![44, 54, 84]);
        assert!(reported.iter().all(|p| p.total == 84));
    }
}
