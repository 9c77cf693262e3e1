use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use viridian_core::config::{ClientConfig, VoiceMode};
use viridian_engine::controller::{ChatController, ControllerSettings};
use viridian_engine::traits::ChatView;
use viridian_engine::voice::VoiceBackend;

use crate::http_backend::HttpChatBackend;
use crate::recorder_source::RecorderSource;

pub const ENV_BASE_URL: &str = "VIRIDIAN_BASE_URL";

/// Values given on the command line. `None` keeps what the config says.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub voice_mode: Option<VoiceMode>,
    pub microphone_device: Option<String>,
}

/// Layers overrides onto a loaded config: file, then environment, then flags.
pub fn apply_overrides(
    mut cfg: ClientConfig,
    env_base_url: Option<String>,
    flags: &ConfigOverrides,
) -> ClientConfig {
    if let Some(url) = env_base_url.filter(|u| !u.trim().is_empty()) {
        log::debug!("{ENV_BASE_URL} overrides base_url");
        cfg.base_url = url;
    }
    if let Some(url) = &flags.base_url {
        cfg.base_url = url.clone();
    }
    if let Some(name) = &flags.username {
        cfg.username = name.clone();
    }
    if let Some(mode) = flags.voice_mode {
        cfg.voice_mode = mode;
    }
    if let Some(dev) = &flags.microphone_device {
        cfg.microphone_device = Some(dev.clone());
    }
    cfg
}

/// Build a ready controller from config and a view.
///
/// Only fails on an invalid config; the server is not contacted here.
pub fn build_controller_from_config(
    cfg: &ClientConfig,
    view: Arc<dyn ChatView>,
) -> anyhow::Result<ChatController> {
    let base_url = cfg.validate().context("invalid client config")?;

    let backend = HttpChatBackend::new(
        base_url.as_str(),
        cfg.request_timeout_secs.map(Duration::from_secs),
    )?;

    let voice = match cfg.voice_mode {
        VoiceMode::Upload => {
            VoiceBackend::Upload(Arc::new(RecorderSource::new(cfg.microphone_device.clone())))
        }
        VoiceMode::Off => VoiceBackend::Unavailable,
    };

    log::info!(
        "chat server: {} (voice: {})",
        backend.base_url(),
        voice.label()
    );

    let settings = ControllerSettings {
        username: cfg.username.trim().to_string(),
        bot_name: cfg.bot_name.clone(),
        language: cfg.language.clone(),
    };

    Ok(ChatController::new(settings, Arc::new(backend), view, voice))
}
