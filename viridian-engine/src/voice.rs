use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::traits::{AudioSource, SpeechRecognizer};
use crate::view::TransientIndicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Transcribing,
}

/// How voice input is turned into text. Exactly one strategy per controller.
#[derive(Clone, Default)]
pub enum VoiceBackend {
    /// Record raw audio and let the server transcribe it.
    Upload(Arc<dyn AudioSource>),
    /// Stream through a recognizer and forward only finalized text.
    Recognition(Arc<dyn SpeechRecognizer>),
    #[default]
    Unavailable,
}

impl VoiceBackend {
    pub fn label(&self) -> &'static str {
        match self {
            VoiceBackend::Upload(_) => "upload",
            VoiceBackend::Recognition(_) => "recognition",
            VoiceBackend::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Debug for VoiceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Idle -> Listening -> Transcribing -> Idle.
///
/// Every capture run gets a generation number; transitions carrying an older
/// generation are ignored so a stopped run cannot touch a newer one.
#[derive(Debug, Default)]
pub(crate) struct VoiceMachine {
    state: VoiceState,
    generation: u64,
    indicator: Option<TransientIndicator>,
    listener: Option<JoinHandle<()>>,
}

impl VoiceMachine {
    pub(crate) fn state(&self) -> VoiceState {
        self.state
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    fn transition(&mut self, next: VoiceState) {
        if self.state != next {
            log::info!("voice: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    pub(crate) fn begin_listening(&mut self, indicator: TransientIndicator) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.indicator = Some(indicator);
        self.transition(VoiceState::Listening);
        self.generation
    }

    pub(crate) fn set_listener(&mut self, handle: JoinHandle<()>) {
        self.listener = Some(handle);
    }

    pub(crate) fn take_listener(&mut self) -> Option<JoinHandle<()>> {
        self.listener.take()
    }

    /// Listening -> Transcribing for the given run. Drops the listening indicator.
    pub(crate) fn begin_transcribing(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != VoiceState::Listening {
            return false;
        }
        if let Some(ind) = self.indicator.take() {
            ind.dismiss();
        }
        self.transition(VoiceState::Transcribing);
        true
    }

    /// Back to Idle for the given run. Returns false for stale or already-idle runs.
    pub(crate) fn finish(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state == VoiceState::Idle {
            return false;
        }
        if let Some(ind) = self.indicator.take() {
            ind.dismiss();
        }
        self.transition(VoiceState::Idle);
        true
    }

    /// Abandons the current run (if any). In-flight work keeps running but can
    /// no longer change the machine.
    pub(crate) fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(ind) = self.indicator.take() {
            ind.dismiss();
        }
        self.transition(VoiceState::Idle);
    }
}
