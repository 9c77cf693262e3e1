use std::sync::{Mutex, MutexGuard};

use viridian_audio::{AudioCaptureError, AudioRecorder, CapturedAudio};
use viridian_engine::traits::{AudioInput, AudioSource, CaptureError};

/// Microphone-backed [`AudioSource`]. The device is opened on first use and
/// kept open afterwards.
pub struct RecorderSource {
    device_name: Option<String>,
    recorder: Mutex<Option<AudioRecorder>>,
}

impl RecorderSource {
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            recorder: Mutex::new(None),
        }
    }

    fn recorder(&self) -> MutexGuard<'_, Option<AudioRecorder>> {
        match self.recorder.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for RecorderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderSource")
            .field("device_name", &self.device_name)
            .finish_non_exhaustive()
    }
}

impl AudioSource for RecorderSource {
    fn start(&self) -> Result<(), CaptureError> {
        let mut slot = self.recorder();
        if slot.is_none() {
            let rec = AudioRecorder::open_named(self.device_name.as_deref()).map_err(to_capture_error)?;
            log::info!("microphone opened at {} Hz", rec.sample_rate_hz());
            *slot = Some(rec);
        }
        match slot.as_ref() {
            Some(rec) => rec.start().map_err(to_capture_error),
            None => Err(CaptureError::Failed("recorder not open".into())),
        }
    }

    fn stop(&self) -> Result<AudioInput, CaptureError> {
        let slot = self.recorder();
        let Some(rec) = slot.as_ref() else {
            return Err(CaptureError::Failed("recording was never started".into()));
        };
        let captured = rec.stop().map_err(to_capture_error)?;
        log::debug!("captured {} ms of audio", captured.duration_ms());
        into_audio_input(captured)
    }
}

fn into_audio_input(captured: CapturedAudio) -> Result<AudioInput, CaptureError> {
    let CapturedAudio {
        sample_rate_hz,
        samples,
    } = captured.into_16k().map_err(to_capture_error)?;
    Ok(AudioInput {
        sample_rate_hz,
        samples,
    })
}

pub fn to_capture_error(e: AudioCaptureError) -> CaptureError {
    match e {
        AudioCaptureError::Unsupported => CaptureError::Unsupported,
        AudioCaptureError::NoInputDevice => {
            CaptureError::Failed("no microphone detected; check the input device".into())
        }
        other => {
            log::error!("audio capture error: {other}");
            CaptureError::Failed(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_errors_are_mapped() {
        assert_eq!(
            to_capture_error(AudioCaptureError::Unsupported),
            CaptureError::Unsupported
        );
        assert!(matches!(
            to_capture_error(AudioCaptureError::NoInputDevice),
            CaptureError::Failed(msg) if msg.contains("microphone")
        ));
        assert!(matches!(
            to_capture_error(AudioCaptureError::StopTimeout),
            CaptureError::Failed(_)
        ));
    }

    #[test]
    fn captured_audio_is_resampled_to_16k() {
        let input = into_audio_input(CapturedAudio {
            sample_rate_hz: 32_000,
            samples: vec![0.1; 3_200],
        })
        .unwrap();
        assert_eq!(input.sample_rate_hz, 16_000);
        assert!(!input.samples.is_empty());
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    #[test]
    fn start_reports_unsupported_without_backend() {
        let source = RecorderSource::new(None);
        assert_eq!(source.start(), Err(CaptureError::Unsupported));
        assert!(source.stop().is_err());
    }

    #[test]
    fn stop_before_start_is_an_error() {
        let source = RecorderSource::new(Some("Nonexistent Mic".into()));
        assert!(matches!(source.stop(), Err(CaptureError::Failed(_))));
    }
}
