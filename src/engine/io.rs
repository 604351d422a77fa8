//! Audio file export for Aura
//!
//! Offline renders of the soundscape are written as WAV. Rendering already
//! happens at the export rate, so no resampling is done here.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;

use crate::engine::buffer::AudioBuffer;
use crate::error::{AuraError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (default: 24)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    /// Create a new export format with the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }

    /// 16-bit integer samples
    pub fn cd_quality() -> Self {
        ExportFormat { bit_depth: 16 }
    }

    /// 32-bit float samples
    pub fn float() -> Self {
        ExportFormat { bit_depth: 32 }
    }
}

fn wav_error(e: hound::Error) -> AuraError {
    match e {
        hound::Error::IoError(io) => AuraError::Io(io),
        other => AuraError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

/// Export an AudioBuffer to a WAV file
///
/// # Errors
/// * `UnsupportedFormat` - bit depth other than 16, 24 or 32, a zero sample
///   rate, or an empty channel list
/// * `Io` - the file cannot be created or written
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(AuraError::UnsupportedFormat {
            format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
        });
    }
    if buffer.sample_rate == 0 {
        return Err(AuraError::UnsupportedFormat {
            format: "0 Hz sample rate".to_string(),
        });
    }
    if buffer.num_channels() == 0 {
        return Err(AuraError::UnsupportedFormat {
            format: "buffer without channels".to_string(),
        });
    }

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;

    for sample in buffer.to_interleaved() {
        let sample = sample.clamp(-1.0, 1.0);
        match format.bit_depth {
            16 => writer
                .write_sample((sample * 32767.0) as i16)
                .map_err(wav_error)?,
            // 24-bit stored as i32 in hound
            24 => writer
                .write_sample((sample * 8388607.0) as i32)
                .map_err(wav_error)?,
            _ => writer.write_sample(sample).map_err(wav_error)?,
        }
    }

    writer.finalize().map_err(wav_error)?;

    info!(
        "Exported {:.2}s ({} ch, {}-bit) to {}",
        buffer.duration_secs(),
        buffer.num_channels(),
        format.bit_depth,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::ChannelLayout;
    use tempfile::tempdir;
    use test_case::test_case;

    fn tone(len: usize) -> AudioBuffer {
        let samples = (0..len)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        AudioBuffer::from_mono(samples, ChannelLayout::Stereo, 48000)
    }

    #[test_case(16 ; "16-bit int")]
    #[test_case(24 ; "24-bit int")]
    #[test_case(32 ; "32-bit float")]
    fn test_export_writes_header(bit_depth: u16) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        export_audio(&tone(4800), &path, ExportFormat::new(bit_depth)).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, bit_depth);
        assert_eq!(reader.duration(), 4800);
    }

    #[test]
    fn test_export_float_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let buffer = tone(100);
        export_audio(&buffer, &path, ExportFormat::float()).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let read: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, buffer.to_interleaved());
    }

    #[test]
    fn test_export_rejects_unsupported_depth() {
        let dir = tempdir().unwrap();
        let err = export_audio(&tone(10), &dir.path().join("x.wav"), ExportFormat::new(8))
            .unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_export_rejects_zero_sample_rate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.wav");
        let buffer = AudioBuffer::from_mono(vec![0.0; 16], ChannelLayout::Mono, 0);
        let err = export_audio(&buffer, &path, ExportFormat::cd_quality()).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert!(!path.exists());
    }
}
