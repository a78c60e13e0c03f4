use std::io::Cursor;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

/// Accumulates raw PCM audio for the lifetime of a recording session.
///
/// Frames arrive as little-endian 16-bit mono samples and are kept verbatim
/// so the full take can be encoded once at finalization.
pub struct RecordingBuffer {
    sample_rate: u32,
    pcm: Vec<u8>,
}

impl RecordingBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            pcm: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, frame: &[u8]) {
        self.pcm.extend_from_slice(frame);
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.pcm.len()
    }

    /// Whole seconds of captured audio (16-bit mono, so two bytes per sample).
    pub fn duration_seconds(&self) -> u64 {
        self.pcm.len() as u64 / (self.sample_rate as u64 * 2)
    }

    /// Encodes the captured audio as a complete in-memory WAV file.
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
            for chunk in self.pcm.chunks_exact(2) {
                let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
                writer
                    .write_sample(sample)
                    .context("Failed to write audio sample")?;
            }
            writer.finalize().context("Failed to finalize WAV data")?;
        }

        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    fn pcm_frame(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn duration_counts_whole_seconds() {
        let mut buffer = RecordingBuffer::new(16000);
        assert_eq!(buffer.duration_seconds(), 0);

        // 1.5s of 16kHz mono 16-bit audio.
        buffer.push_frame(&vec![0u8; 16000 * 2 + 16000]);
        assert_eq!(buffer.duration_seconds(), 1);

        buffer.push_frame(&vec![0u8; 16000]);
        assert_eq!(buffer.duration_seconds(), 2);
    }

    #[test]
    fn wav_round_trips_samples() {
        let mut buffer = RecordingBuffer::new(16000);
        let samples = [0i16, 100, -100, i16::MAX, i16::MIN];
        buffer.push_frame(&pcm_frame(&samples));

        let wav = buffer.to_wav().unwrap();
        let reader = WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn empty_buffer_encodes_header_only() {
        let buffer = RecordingBuffer::new(16000);
        assert!(buffer.is_empty());

        let wav = buffer.to_wav().unwrap();
        // RIFF/fmt/data headers with no payload.
        assert_eq!(wav.len(), 44);
    }
}
