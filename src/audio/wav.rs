//! Canonical WAV container encoding for utterance export and debug captures.
//!
//! The pipeline emits uncompressed PCM wrapped in the fixed 44-byte RIFF
//! header that every standard decoder accepts. Field order and little-endian
//! byte order are load-bearing; the STT collaborator consumes these files
//! directly.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Length of the canonical header preceding the PCM payload.
pub const HEADER_LEN: usize = 44;

/// PCM format metadata carried alongside a raw byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Format the segmentation pipeline operates at.
    pub fn pipeline() -> Self {
        Self {
            sample_rate: super::PIPELINE_RATE,
            channels: super::PIPELINE_CHANNELS,
            bits_per_sample: super::PIPELINE_BITS,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.channels) * u32::from(self.bits_per_sample) / 8
    }

    /// Playback duration of `data_len` payload bytes in milliseconds.
    pub fn duration_ms(&self, data_len: usize) -> u64 {
        let byte_rate = u64::from(self.byte_rate()).max(1);
        (data_len as u64).saturating_mul(1000) / byte_rate
    }
}

/// Serialize a PCM payload into a complete WAV byte sequence.
///
/// The payload is copied verbatim after the header; no sample conversion
/// happens here.
pub fn encode(pcm: &[u8], format: WavFormat) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Parse a WAV byte sequence back into its format fields and PCM payload.
///
/// Accepts the canonical layout plus files with extra metadata chunks between
/// `fmt ` and `data` (some recorders insert LIST chunks).
pub fn decode(bytes: &[u8]) -> Result<(WavFormat, Vec<u8>)> {
    if bytes.len() < HEADER_LEN {
        bail!("wav data too short: {} bytes", bytes.len());
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        bail!("missing RIFF/WAVE tags");
    }

    let mut format: Option<WavFormat> = None;
    let mut cursor = 12usize;
    while cursor + 8 <= bytes.len() {
        let tag = &bytes[cursor..cursor + 4];
        let size = u32::from_le_bytes(
            bytes[cursor + 4..cursor + 8]
                .try_into()
                .context("truncated chunk size")?,
        ) as usize;
        let body_start = cursor + 8;
        let body_end = body_start
            .checked_add(size)
            .filter(|end| *end <= bytes.len())
            .with_context(|| format!("chunk '{}' overruns file", String::from_utf8_lossy(tag)))?;

        match tag {
            b"fmt " => {
                if size < 16 {
                    bail!("fmt chunk too short: {size} bytes");
                }
                let body = &bytes[body_start..body_end];
                let audio_format = u16::from_le_bytes([body[0], body[1]]);
                if audio_format != 1 {
                    bail!("unsupported audio format {audio_format}, expected PCM");
                }
                format = Some(WavFormat {
                    channels: u16::from_le_bytes([body[2], body[3]]),
                    sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                    bits_per_sample: u16::from_le_bytes([body[14], body[15]]),
                });
            }
            b"data" => {
                let format = format.context("data chunk before fmt chunk")?;
                return Ok((format, bytes[body_start..body_end].to_vec()));
            }
            _ => {}
        }
        // Chunks are word-aligned; odd sizes carry one pad byte.
        cursor = body_end + (size & 1);
    }
    bail!("no data chunk found");
}

/// File name for an emitted utterance, millisecond precision so rapid
/// consecutive phrases never collide.
pub fn utterance_filename(at: DateTime<Local>) -> String {
    format!("utterance_{}.wav", at.format("%Y%m%d_%H%M%S_%3f"))
}

/// Write one utterance's PCM to `dir` and return the artifact path.
pub fn write_utterance(dir: &Path, pcm: &[u8], format: WavFormat) -> Result<PathBuf> {
    let path = dir.join(utterance_filename(Local::now()));
    fs::write(&path, encode(pcm, format))
        .with_context(|| format!("failed to write utterance to {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = pcm.len(), "utterance written");
    Ok(path)
}

/// Write a whole session's PCM for offline inspection.
pub fn write_debug_recording(dir: &Path, pcm: &[u8], format: WavFormat) -> Result<PathBuf> {
    let name = format!("audio-recording-{}.wav", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    fs::write(&path, encode(pcm, format))
        .with_context(|| format!("failed to write debug recording to {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = pcm.len(), "debug recording written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_exactly_44_bytes() {
        let encoded = encode(&[], WavFormat::pipeline());
        assert_eq!(encoded.len(), HEADER_LEN);
    }

    #[test]
    fn riff_chunk_size_tracks_payload() {
        let pcm = [0u8; 96];
        let encoded = encode(&pcm, WavFormat::pipeline());
        let riff_size = u32::from_le_bytes([encoded[4], encoded[5], encoded[6], encoded[7]]);
        assert_eq!(riff_size, 36 + 96);
        let data_size = u32::from_le_bytes([encoded[40], encoded[41], encoded[42], encoded[43]]);
        assert_eq!(data_size, 96);
    }

    #[test]
    fn duration_accounts_for_block_align() {
        let format = WavFormat {
            sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
        };
        // One second of 16-bit mono at 16 kHz is 32000 bytes.
        assert_eq!(format.duration_ms(32_000), 1000);
    }

    #[test]
    fn utterance_filenames_carry_millis() {
        let at = Local::now();
        let name = utterance_filename(at);
        assert!(name.starts_with("utterance_"));
        assert!(name.ends_with(".wav"));
        // prefix + yyyymmdd_hhmmss_mmm + suffix
        assert_eq!(name.len(), "utterance_".len() + 19 + ".wav".len());
    }
}
