//! Canonical 44-byte PCM WAV header
//!
//! Layout (all integers little-endian):
//!
//! | offset | field            |
//! |--------|------------------|
//! | 0      | `RIFF`           |
//! | 4      | riff size        |
//! | 8      | `WAVE`           |
//! | 12     | `fmt `           |
//! | 16     | fmt size (16)    |
//! | 20     | format tag       |
//! | 22     | channels         |
//! | 24     | sample rate      |
//! | 28     | byte rate        |
//! | 32     | block align      |
//! | 34     | bits per sample  |
//! | 36     | `data`           |
//! | 40     | data size        |

use super::AudioSpec;
use crate::error::{Error, Result};

pub const WAV_HEADER_LEN: usize = 44;

/// Bytes of the RIFF chunk that precede the data payload, counted from offset 8.
const RIFF_OVERHEAD: u32 = (WAV_HEADER_LEN - 8) as u32;
const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `data_size` bytes of PCM in the given format.
    pub fn new(spec: AudioSpec, data_size: u32) -> Result<Self> {
        let bytes_per_sample = (spec.bit_depth as u32 + 7) / 8;
        let block_align = bytes_per_sample * spec.channels as u32;
        let mut header = Self {
            riff_size: 0,
            format_tag: FORMAT_PCM,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            byte_rate: spec.sample_rate * block_align,
            block_align: block_align as u16,
            bits_per_sample: spec.bit_depth,
            data_size: 0,
        };
        header.set_data_size(data_size)?;
        Ok(header)
    }

    /// Parse the first 44 bytes of a canonical PCM WAV container.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(Error::AudioError(format!(
                "WAV container is {} bytes, shorter than its {} byte header",
                bytes.len(),
                WAV_HEADER_LEN
            )));
        }
        expect_tag(bytes, 0, b"RIFF")?;
        expect_tag(bytes, 8, b"WAVE")?;
        expect_tag(bytes, 12, b"fmt ")?;
        let fmt_len = read_u32(bytes, 16);
        if fmt_len != FMT_CHUNK_LEN {
            return Err(Error::AudioError(format!(
                "fmt chunk is {} bytes; only the {} byte PCM layout is supported",
                fmt_len, FMT_CHUNK_LEN
            )));
        }
        expect_tag(bytes, 36, b"data")?;

        Ok(Self {
            riff_size: read_u32(bytes, 4),
            format_tag: read_u16(bytes, 20),
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_size: read_u32(bytes, 40),
        })
    }

    pub fn pack(&self) -> [u8; WAV_HEADER_LEN] {
        let mut out = [0u8; WAV_HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.riff_size.to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out[20..22].copy_from_slice(&self.format_tag.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Set the data chunk size and the RIFF size derived from it.
    pub fn set_data_size(&mut self, data_size: u32) -> Result<()> {
        self.riff_size = data_size.checked_add(RIFF_OVERHEAD).ok_or_else(|| {
            Error::AudioError(format!(
                "{} bytes of audio exceed the WAV size limit",
                data_size
            ))
        })?;
        self.data_size = data_size;
        Ok(())
    }

    pub fn spec(&self) -> AudioSpec {
        AudioSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bit_depth: self.bits_per_sample,
        }
    }
}

fn expect_tag(bytes: &[u8], offset: usize, tag: &[u8; 4]) -> Result<()> {
    if &bytes[offset..offset + 4] != tag {
        return Err(Error::AudioError(format!(
            "expected {:?} at offset {}",
            String::from_utf8_lossy(tag),
            offset
        )));
    }
    Ok(())
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
