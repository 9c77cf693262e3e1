use crate::resample::resample_mono_f32;

/// Sample rate the chat server's transcriber expects.
pub const TARGET_SAMPLE_RATE_HZ: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum AudioCaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("audio capture is not supported on this platform")]
    Unsupported,

    #[cfg(any(windows, target_os = "macos"))]
    #[error("failed to list input devices: {0}")]
    ListDevices(#[from] cpal::DevicesError),

    #[cfg(any(windows, target_os = "macos"))]
    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("audio worker failed: {0}")]
    Worker(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("failed to resample: {0}")]
    Resample(#[from] anyhow::Error),

    #[error("internal channel error")]
    Channel,
}

/// Mono PCM samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate_hz as u64
    }

    pub fn into_16k(self) -> Result<CapturedAudio, AudioCaptureError> {
        if self.sample_rate_hz == TARGET_SAMPLE_RATE_HZ {
            return Ok(self);
        }
        let samples = resample_mono_f32(&self.samples, self.sample_rate_hz, TARGET_SAMPLE_RATE_HZ)?;
        Ok(CapturedAudio {
            sample_rate_hz: TARGET_SAMPLE_RATE_HZ,
            samples,
        })
    }
}
