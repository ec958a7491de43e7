//! Duration-limited splitting of an audiobook into WAV parts

use std::io::{Cursor, Write};
use std::ops::Range;
use std::time::Duration;
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{concatenate, DecodedAudio};
use crate::error::Result;

/// Group consecutive clips so each group lasts at most `max_duration`.
///
/// Clips are never cut: a clip longer than the limit forms a group of its own.
pub fn group_by_duration(clips: &[DecodedAudio], max_duration: Duration) -> Vec<Range<usize>> {
    let limit = max_duration.as_secs_f64();
    let mut groups = Vec::new();
    let mut start = 0;
    let mut current = 0.0f64;

    for (i, clip) in clips.iter().enumerate() {
        let length = clip.duration().as_secs_f64();
        if i > start && current + length > limit {
            groups.push(start..i);
            start = i;
            current = 0.0;
        }
        current += length;
    }

    if start < clips.len() {
        groups.push(start..clips.len());
    }
    groups
}

/// Concatenate each duration-limited group into its own WAV container.
pub fn split_into_parts(clips: &[DecodedAudio], max_duration: Duration) -> Result<Vec<Vec<u8>>> {
    let groups = group_by_duration(clips, max_duration);
    info!(
        "Splitting {} clips into {} parts of at most {:?}",
        clips.len(),
        groups.len(),
        max_duration
    );
    groups
        .into_iter()
        .map(|range| concatenate(&clips[range]))
        .collect()
}

/// Package WAV parts as `part_001.wav`, `part_002.wav`, ... in a ZIP archive.
pub fn zip_parts(parts: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    for (i, part) in parts.iter().enumerate() {
        writer.start_file(format!("part_{:03}.wav", i + 1), options)?;
        writer.write_all(part)?;
    }

    Ok(writer.finish()?.into_inner())
}
