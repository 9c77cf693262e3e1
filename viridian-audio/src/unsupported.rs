use std::convert::Infallible;

use crate::capture::{AudioCaptureError, CapturedAudio};

/// Placeholder recorder for platforms without a capture backend.
///
/// Opening always fails with [`AudioCaptureError::Unsupported`]; the type is
/// uninhabited, so the instance methods only exist to match the real API.
pub struct AudioRecorder {
    never: Infallible,
}

impl AudioRecorder {
    pub fn list_input_device_names() -> Result<Vec<String>, AudioCaptureError> {
        Ok(vec![])
    }

    pub fn open_named(_device_name: Option<&str>) -> Result<Self, AudioCaptureError> {
        Err(AudioCaptureError::Unsupported)
    }

    pub fn sample_rate_hz(&self) -> u32 {
        match self.never {}
    }

    pub fn start(&self) -> Result<(), AudioCaptureError> {
        match self.never {}
    }

    pub fn stop(&self) -> Result<CapturedAudio, AudioCaptureError> {
        match self.never {}
    }
}
