//! The narration track handed to a render.

use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};

use crate::Result;

/// An audio file plus its duration in seconds.
///
/// The allocator only needs the scalar; encoders attach the file itself at
/// render time. Providers usually know the duration already, so `new` takes
/// it directly; `from_wav_file` probes it for WAV input.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationAudio {
    pub path: PathBuf,
    pub duration_seconds: f64,
}

impl NarrationAudio {
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64) -> Self {
        Self {
            path: path.into(),
            duration_seconds,
        }
    }

    /// Probe a WAV file for its duration.
    ///
    /// A missing or malformed narration track makes the whole render
    /// meaningless, so this fails loudly instead of guessing.
    pub fn from_wav_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::probe_wav(path.as_ref())?)
    }

    fn probe_wav(path: &Path) -> anyhow::Result<Self> {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open narration WAV '{}'", path.display()))?;
        let spec = reader.spec();
        ensure!(
            spec.sample_rate > 0,
            "narration WAV '{}' reports a zero sample rate",
            path.display()
        );

        let duration_seconds = f64::from(reader.duration()) / f64::from(spec.sample_rate);
        ensure!(
            duration_seconds > 0.0,
            "narration WAV '{}' contains no samples",
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, samples: u32) -> anyhow::Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for _ in 0..samples {
            writer.write_sample(0i16)?;
        }
        writer.finalize()?;
        Ok(())
    }

    #[test]
    fn probes_wav_duration() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("narration.wav");
        write_wav(&path, 8_000)?;

        let audio = NarrationAudio::from_wav_file(&path)?;
        assert!((audio.duration_seconds - 0.5).abs() < 1e-9);
        assert_eq!(audio.path, path);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = NarrationAudio::from_wav_file("/nonexistent/narration.wav").unwrap_err();
        assert!(err.to_string().contains("failed to open narration WAV"));
    }

    #[test]
    fn empty_wav_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.wav");
        write_wav(&path, 0)?;

        assert!(NarrationAudio::from_wav_file(&path).is_err());
        Ok(())
    }
}
