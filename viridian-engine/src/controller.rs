use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc};
use viridian_core::config::{DEFAULT_BOT_NAME, DEFAULT_LANGUAGE, DEFAULT_USERNAME};
use viridian_core::text::{
    NOTICE_BUSY, NOTICE_DISPATCH_FAILED, NOTICE_LISTENING, NOTICE_NO_AUDIO, NOTICE_NO_REPLY,
    NOTICE_NOT_CAUGHT, NOTICE_RECOGNITION_FAILED, NOTICE_RECOGNITION_UNSUPPORTED,
    NOTICE_SESSION_FAILED, NOTICE_SUMMARY_FAILED, NOTICE_SUMMARY_MISSING,
    NOTICE_SUMMARY_PENDING, NOTICE_UPLOAD_FAILED, normalize_input, normalize_transcript,
    preview_text, typing_notice,
};
use viridian_core::types::{Sender, SessionId};

use crate::session::SessionState;
use crate::traits::{
    AudioSource, BotReply, CaptureError, ChatBackend, ChatView, RecognitionEvent,
    SpeechRecognizer, VoiceReply,
};
use crate::view::TransientIndicator;
use crate::voice::{VoiceBackend, VoiceMachine, VoiceState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub username: String,
    pub bot_name: String,
    pub language: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.into(),
            bot_name: DEFAULT_BOT_NAME.into(),
            language: DEFAULT_LANGUAGE.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    NoSession,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Replied,
    NoReply,
    Failed,
    Ignored(IgnoreReason),
}

struct Inner {
    settings: ControllerSettings,
    backend: Arc<dyn ChatBackend>,
    view: Arc<dyn ChatView>,
    voice_backend: VoiceBackend,
    session: SessionState,

    // Set while a message is out to the server; later sends are dropped.
    busy: AtomicBool,
    voice: Mutex<VoiceMachine>,
}

/// Single owner of the chat session, the transcript view and voice capture.
///
/// Cloning is cheap; clones share all state.
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<Inner>,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatController {
    pub fn new(
        settings: ControllerSettings,
        backend: Arc<dyn ChatBackend>,
        view: Arc<dyn ChatView>,
        voice_backend: VoiceBackend,
    ) -> Self {
        log::debug!("controller created (voice={})", voice_backend.label());
        Self {
            inner: Arc::new(Inner {
                settings,
                backend,
                view,
                voice_backend,
                session: SessionState::new(),
                busy: AtomicBool::new(false),
                voice: Mutex::new(VoiceMachine::default()),
            }),
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.session.current()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    pub async fn voice_state(&self) -> VoiceState {
        self.inner.voice.lock().await.state()
    }

    /// Opens the server session. Failures are rendered, never returned.
    pub async fn start_session(&self) -> Option<SessionId> {
        if let Some(existing) = self.inner.session.current() {
            log::debug!("session already started: {existing}");
            return Some(existing);
        }

        match self
            .inner
            .backend
            .start_session(&self.inner.settings.username)
            .await
        {
            Ok(id) => {
                let id = self.inner.session.set_once(id);
                log::info!("session started: {id}");
                Some(id)
            }
            Err(e) => {
                log::error!("start_session failed: {e:#}");
                self.inner.view.append(Sender::Bot, NOTICE_SESSION_FAILED);
                None
            }
        }
    }

    /// Sends typed text. Blank input, a missing session, or an outstanding
    /// send make this a no-op.
    pub async fn send_text(&self, raw: &str) -> DispatchOutcome {
        self.submit(raw, true).await
    }

    async fn submit(&self, raw: &str, from_input: bool) -> DispatchOutcome {
        let Some(text) = normalize_input(raw) else {
            return DispatchOutcome::Ignored(IgnoreReason::Empty);
        };
        let Some(session) = self.inner.session.current() else {
            log::debug!("send ignored: no session");
            return DispatchOutcome::Ignored(IgnoreReason::NoSession);
        };
        let Some(_busy) = BusyGuard::acquire(&self.inner.busy) else {
            log::warn!("send dropped while another is in flight: {}", preview_text(&text));
            return DispatchOutcome::Ignored(IgnoreReason::Busy);
        };

        self.inner.view.append(Sender::User, &text);
        if from_input {
            self.inner.view.clear_input();
        }

        self.dispatch_to_bot(&session, &text).await
    }

    // Caller holds the busy guard.
    async fn dispatch_to_bot(&self, session: &SessionId, text: &str) -> DispatchOutcome {
        let typing = TransientIndicator::show(
            &self.inner.view,
            Sender::System,
            &typing_notice(&self.inner.settings.bot_name),
        );
        let result = self.inner.backend.send_text(session, text).await;
        typing.dismiss();

        match result {
            Ok(BotReply {
                reply: Some(reply),
                emotion,
            }) => {
                if let Some(emotion) = emotion {
                    log::debug!("server emotion: {emotion}");
                }
                self.inner.view.append(Sender::Bot, &reply);
                DispatchOutcome::Replied
            }
            Ok(BotReply { reply: None, .. }) => {
                log::warn!("send_text response had no reply");
                self.inner.view.append(Sender::Bot, NOTICE_NO_REPLY);
                DispatchOutcome::NoReply
            }
            Err(e) => {
                log::error!("send_text failed: {e:#}");
                self.inner.view.append(Sender::Bot, NOTICE_DISPATCH_FAILED);
                DispatchOutcome::Failed
            }
        }
    }

    /// Asks the server to close out the session and renders its summary.
    pub async fn end_session(&self) -> Option<String> {
        let session = self.inner.session.current()?;

        let pending =
            TransientIndicator::show(&self.inner.view, Sender::System, NOTICE_SUMMARY_PENDING);
        let result = self.inner.backend.end_session(&session).await;
        pending.dismiss();

        match result {
            Ok(Some(summary)) => {
                // Rendered verbatim; the summary is multi-line.
                self.inner.view.append(Sender::Bot, &summary);
                Some(summary)
            }
            Ok(None) => {
                log::warn!("end_session returned no summary");
                self.inner.view.append(Sender::Bot, NOTICE_SUMMARY_MISSING);
                None
            }
            Err(e) => {
                log::error!("end_session failed: {e:#}");
                self.inner.view.append(Sender::Bot, NOTICE_SUMMARY_FAILED);
                None
            }
        }
    }

    /// Starts voice capture. A run that is already active is stopped first.
    pub async fn start_voice(&self) -> VoiceState {
        match &self.inner.voice_backend {
            VoiceBackend::Unavailable => {
                log::warn!("voice requested but no voice backend is configured");
                self.inner
                    .view
                    .append(Sender::Bot, NOTICE_RECOGNITION_UNSUPPORTED);
                VoiceState::Idle
            }
            VoiceBackend::Upload(source) => self.start_upload_capture(source.clone()).await,
            VoiceBackend::Recognition(recognizer) => {
                self.start_recognition(recognizer.clone()).await
            }
        }
    }

    async fn start_upload_capture(&self, source: Arc<dyn AudioSource>) -> VoiceState {
        let mut voice = self.inner.voice.lock().await;
        if voice.state() == VoiceState::Listening {
            log::info!("restarting capture; previous recording discarded");
            let _ = source.stop();
        }
        voice.reset();

        if let Err(e) = source.start() {
            self.render_capture_error(&e);
            return VoiceState::Idle;
        }

        let indicator = TransientIndicator::show(&self.inner.view, Sender::System, NOTICE_LISTENING);
        voice.begin_listening(indicator);
        VoiceState::Listening
    }

    async fn start_recognition(&self, recognizer: Arc<dyn SpeechRecognizer>) -> VoiceState {
        let mut voice = self.inner.voice.lock().await;
        if voice.state() != VoiceState::Idle {
            recognizer.stop();
        }
        voice.reset();

        let events = match recognizer.start(&self.inner.settings.language) {
            Ok(rx) => rx,
            Err(e) => {
                self.render_capture_error(&e);
                return VoiceState::Idle;
            }
        };

        let indicator = TransientIndicator::show(&self.inner.view, Sender::System, NOTICE_LISTENING);
        let generation = voice.begin_listening(indicator);

        let controller = self.clone();
        let handle = tokio::spawn(async move {
            controller
                .pump_recognition(recognizer, events, generation)
                .await;
        });
        voice.set_listener(handle);
        VoiceState::Listening
    }

    async fn pump_recognition(
        &self,
        recognizer: Arc<dyn SpeechRecognizer>,
        mut events: mpsc::Receiver<RecognitionEvent>,
        generation: u64,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                RecognitionEvent::Interim(text) => {
                    log::debug!("interim transcript: {}", preview_text(&text));
                }
                RecognitionEvent::Final(text) => {
                    if !self.inner.voice.lock().await.begin_transcribing(generation) {
                        return;
                    }
                    recognizer.stop();

                    match normalize_transcript(&text) {
                        Some(text) => {
                            let outcome = self.submit(&text, false).await;
                            if outcome == DispatchOutcome::Ignored(IgnoreReason::Busy) {
                                self.inner.view.append(Sender::Bot, NOTICE_BUSY);
                            }
                        }
                        None => {
                            self.inner.view.append(Sender::Bot, NOTICE_NOT_CAUGHT);
                        }
                    }
                    self.inner.voice.lock().await.finish(generation);
                    return;
                }
                RecognitionEvent::Error(message) => {
                    if self.inner.voice.lock().await.finish(generation) {
                        log::warn!("recognition error: {message}");
                        self.inner.view.append(Sender::Bot, NOTICE_RECOGNITION_FAILED);
                    }
                    return;
                }
                RecognitionEvent::End => break,
            }
        }

        self.inner.voice.lock().await.finish(generation);
    }

    /// Stops voice capture. A no-op unless currently listening.
    ///
    /// In upload mode this also sends the recording and renders the reply.
    pub async fn stop_voice(&self) {
        let mut voice = self.inner.voice.lock().await;
        if voice.state() != VoiceState::Listening {
            log::debug!("stop_voice: nothing to stop ({:?})", voice.state());
            return;
        }

        match &self.inner.voice_backend {
            VoiceBackend::Recognition(recognizer) => {
                // The run stays current: the recognizer flushes its final
                // result, and the listener finishes the run from there.
                drop(voice);
                recognizer.stop();
            }
            VoiceBackend::Upload(source) => {
                let generation = voice.generation();
                voice.begin_transcribing(generation);
                drop(voice);

                self.upload_recording(source.as_ref()).await;
                self.inner.voice.lock().await.finish(generation);
            }
            VoiceBackend::Unavailable => voice.reset(),
        }
    }

    async fn upload_recording(&self, source: &dyn AudioSource) {
        let audio = match source.stop() {
            Ok(a) => a,
            Err(e) => {
                log::error!("stop recording failed: {e}");
                self.inner.view.append(Sender::Bot, NOTICE_UPLOAD_FAILED);
                return;
            }
        };

        log::info!(
            "captured audio: {} samples at {} Hz",
            audio.samples.len(),
            audio.sample_rate_hz
        );
        if audio.is_too_short() {
            self.inner.view.append(Sender::Bot, NOTICE_NO_AUDIO);
            return;
        }

        let Some(session) = self.inner.session.current() else {
            log::warn!("recording discarded: no session");
            return;
        };
        let Some(_busy) = BusyGuard::acquire(&self.inner.busy) else {
            log::warn!("recording dropped while another send is in flight");
            self.inner.view.append(Sender::Bot, NOTICE_BUSY);
            return;
        };

        let pending = TransientIndicator::show(
            &self.inner.view,
            Sender::System,
            &typing_notice(&self.inner.settings.bot_name),
        );
        let result = self.inner.backend.upload_audio(&session, &audio).await;
        pending.dismiss();

        match result {
            Ok(VoiceReply {
                transcript,
                reply,
                emotion,
            }) => {
                if let Some(emotion) = emotion {
                    log::debug!("server emotion: {emotion}");
                }
                match transcript {
                    Some(raw) => match normalize_transcript(&raw) {
                        Some(text) => {
                            self.inner.view.append(Sender::User, &text);
                        }
                        None => {
                            self.inner.view.append(Sender::Bot, NOTICE_NOT_CAUGHT);
                        }
                    },
                    None => log::debug!("server did not echo the transcript"),
                }
                match reply {
                    Some(reply) => {
                        self.inner.view.append(Sender::Bot, &reply);
                    }
                    None => {
                        self.inner.view.append(Sender::Bot, NOTICE_NO_REPLY);
                    }
                }
            }
            Err(e) => {
                log::error!("upload_audio failed: {e:#}");
                self.inner.view.append(Sender::Bot, NOTICE_UPLOAD_FAILED);
            }
        }
    }

    fn render_capture_error(&self, e: &CaptureError) {
        match e {
            CaptureError::Unsupported => {
                log::warn!("voice capture unsupported");
                self.inner
                    .view
                    .append(Sender::Bot, NOTICE_RECOGNITION_UNSUPPORTED);
            }
            CaptureError::Failed(msg) => {
                log::error!("voice capture failed to start: {msg}");
                self.inner.view.append(Sender::Bot, NOTICE_RECOGNITION_FAILED);
            }
        }
    }

    /// Waits for the current recognition run (if any) to wind down.
    pub async fn join_listener(&self) {
        let handle = self.inner.voice.lock().await.take_listener();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("recognition listener task failed: {e}");
            }
        }
    }
}
