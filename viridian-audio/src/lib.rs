pub mod capture;
pub mod resample;
pub mod wav;

#[cfg(any(windows, target_os = "macos"))]
mod recorder;
#[cfg(not(any(windows, target_os = "macos")))]
mod unsupported;

pub use capture::{AudioCaptureError, CapturedAudio, TARGET_SAMPLE_RATE_HZ};

#[cfg(any(windows, target_os = "macos"))]
pub use recorder::AudioRecorder;
#[cfg(not(any(windows, target_os = "macos")))]
pub use unsupported::AudioRecorder;
