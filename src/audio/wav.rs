//! WAV file support: replaying recordings as a frame source and dumping
//! finalized segments for debugging.

use crate::audio::source::FrameSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, VoxgateError};
use std::io::Read;
use std::path::Path;

/// Frame source that replays WAV file data.
///
/// Accepts arbitrary sample rates and channel counts, downmixing to mono and
/// resampling to the pipeline rate. Reads come back in 100ms chunks until
/// the data runs out; `is_finite` is true.
pub struct WavFrameSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
}

impl WavFrameSource {
    /// Create from any reader (file, cursor, stdin buffer).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| VoxgateError::AudioCapture {
                message: format!("Failed to parse WAV data: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        let raw_samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => wav_reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
        }
        .map_err(|e| VoxgateError::AudioCapture {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

        // Downmix to mono by averaging channels
        let mono_samples: Vec<f32> = if source_channels > 1 {
            raw_samples
                .chunks_exact(source_channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / source_channels as f32)
                .collect()
        } else {
            raw_samples
        };

        let samples = if source_rate != SAMPLE_RATE {
            resample(&mono_samples, source_rate, SAMPLE_RATE)
        } else {
            mono_samples
        };

        // 100ms chunks at the pipeline rate
        let chunk_size = SAMPLE_RATE as usize / 10;

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
        })
    }

    /// Create from a WAV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_reader(Box::new(std::io::Cursor::new(data)))
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl FrameSource for WavFrameSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Write normalized f32 samples to a 16-bit mono WAV file.
///
/// Used for the optional per-segment debug dump.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| VoxgateError::Other(format!(
            "Failed to create WAV file: {}",
            e
        )))?;

    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(value)
            .map_err(|e| VoxgateError::Other(format!("Failed to write WAV sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| VoxgateError::Other(format!("Failed to finalize WAV file: {}", e)))
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("create writer");
            for &s in samples {
                writer.write_sample(s).expect("write sample");
            }
            writer.finalize().expect("finalize");
        }
        cursor.into_inner()
    }

    #[test]
    fn reads_mono_16khz_unchanged() {
        let samples: Vec<i16> = vec![0, 16384, -16384, 32767];
        let data = make_wav_data(16_000, 1, &samples);
        let source = WavFrameSource::from_reader(Box::new(Cursor::new(data))).expect("parse");

        let out = source.into_samples();
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-3);
        assert!((out[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        let samples: Vec<i16> = vec![1000, 3000, -1000, -3000];
        let data = make_wav_data(16_000, 2, &samples);
        let source = WavFrameSource::from_reader(Box::new(Cursor::new(data))).expect("parse");

        let out = source.into_samples();
        assert_eq!(out.len(), 2);
        assert!((out[0] - 2000.0 / 32768.0).abs() < 1e-4);
        assert!((out[1] + 2000.0 / 32768.0).abs() < 1e-4);
    }

    #[test]
    fn resamples_to_pipeline_rate() {
        let samples: Vec<i16> = vec![100; 32_000];
        let data = make_wav_data(32_000, 1, &samples);
        let source = WavFrameSource::from_reader(Box::new(Cursor::new(data))).expect("parse");

        let out = source.into_samples();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn reads_come_in_chunks_then_empty() {
        let samples: Vec<i16> = vec![0; 3200]; // 200ms at 16kHz
        let data = make_wav_data(16_000, 1, &samples);
        let mut source = WavFrameSource::from_reader(Box::new(Cursor::new(data))).expect("parse");

        source.start().expect("start");
        assert_eq!(source.read_samples().expect("read").len(), 1600);
        assert_eq!(source.read_samples().expect("read").len(), 1600);
        assert!(source.read_samples().expect("read").is_empty());
        assert!(source.is_finite());
    }

    #[test]
    fn invalid_data_is_rejected() {
        let result = WavFrameSource::from_reader(Box::new(Cursor::new(vec![1u8, 2, 3, 4])));
        assert!(result.is_err());
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn resample_downsamples_by_half() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample(&samples, 32_000, 16_000);
        assert_eq!(out.len(), 50);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn resample_upsamples_by_double() {
        let samples = vec![0.0, 1.0];
        let out = resample(&samples, 8_000, 16_000);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn wav_roundtrip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("segment.wav");
        let samples = vec![0.0, 0.25, -0.25, 0.5];

        write_wav(&path, &samples, 16_000).expect("write");
        let source = WavFrameSource::from_path(&path).expect("read back");
        let out = source.into_samples();

        assert_eq!(out.len(), 4);
        for (a, b) in samples.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }
}
