//! `viridian`: terminal client for the Viridian chat server.
//!
//! Lines typed on stdin are sent as messages. Commands:
//!   /voice    start recording
//!   /stop     stop recording and send it
//!   /summary  end the session and show its summary
//!   /quit     exit

mod terminal_view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use viridian_core::config::VoiceMode;
use viridian_engine::controller::ChatController;
use viridian_runtime::config_store::{CONFIG_FILE_NAME, ConfigStore};
use viridian_runtime::controller_builder::{
    ConfigOverrides, ENV_BASE_URL, apply_overrides, build_controller_from_config,
};

use crate::terminal_view::TerminalView;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceArg {
    Upload,
    Off,
}

impl From<VoiceArg> for VoiceMode {
    fn from(v: VoiceArg) -> Self {
        match v {
            VoiceArg::Upload => VoiceMode::Upload,
            VoiceArg::Off => VoiceMode::Off,
        }
    }
}

/// Chat with a Viridian server from the terminal
#[derive(clap::Parser, Debug)]
#[command(name = "viridian")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON client config
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Chat server URL (overrides config and VIRIDIAN_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Name sent when opening the session
    #[arg(short, long)]
    username: Option<String>,

    /// How voice input is handled
    #[arg(long, value_enum)]
    voice: Option<VoiceArg>,

    /// Input device name for recording
    #[arg(short, long)]
    microphone: Option<String>,

    /// Print available input devices and exit
    #[arg(long, default_value = "false")]
    list_microphones: bool,

    /// Write the effective config back to --config
    #[arg(long, default_value = "false")]
    save_config: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Say(String),
    Voice,
    Stop,
    Summary,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed {
        "/voice" => Command::Voice,
        "/stop" => Command::Stop,
        "/summary" => Command::Summary,
        "/quit" | "/exit" => Command::Quit,
        s if s.starts_with('/') && !s.contains(char::is_whitespace) => {
            Command::Unknown(s.to_string())
        }
        _ => Command::Say(line.to_string()),
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    if args.list_microphones {
        let names = viridian_audio::AudioRecorder::list_input_device_names()
            .context("list input devices")?;
        if names.is_empty() {
            println!("(no input devices)");
        }
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let store = ConfigStore::at_path(&args.config);
    let cfg = store.load()?;
    let cfg = apply_overrides(
        cfg,
        std::env::var(ENV_BASE_URL).ok(),
        &ConfigOverrides {
            base_url: args.base_url.clone(),
            username: args.username.clone(),
            voice_mode: args.voice.map(Into::into),
            microphone_device: args.microphone.clone(),
        },
    );
    if args.save_config {
        store.save(&cfg)?;
        log::info!("config written to {}", store.path().display());
    }

    let view = Arc::new(TerminalView::new(cfg.bot_name.clone()));
    let controller = build_controller_from_config(&cfg, view)?;
    controller.start_session().await;

    run_repl(controller).await
}

async fn run_repl(controller: ChatController) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Sends and uploads run alongside the prompt; they are awaited before exit.
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines.next_line().await.context("read stdin")? {
        while in_flight.try_join_next().is_some() {}

        match parse_command(&line) {
            Command::Say(text) => {
                let c = controller.clone();
                in_flight.spawn(async move {
                    c.send_text(&text).await;
                });
            }
            Command::Voice => {
                controller.start_voice().await;
            }
            Command::Stop => {
                let c = controller.clone();
                in_flight.spawn(async move { c.stop_voice().await });
            }
            Command::Summary => {
                controller.end_session().await;
            }
            Command::Quit => break,
            Command::Unknown(cmd) => {
                eprintln!("unknown command {cmd}; try /voice, /stop, /summary or /quit");
            }
        }
    }

    drain(&mut in_flight).await;
    log::info!("bye");
    Ok(())
}

async fn drain(tasks: &mut JoinSet<()>) {
    if !tasks.is_empty() {
        log::info!("waiting for {} pending request(s)", tasks.len());
    }
    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            log::error!("request task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognized() {
        assert_eq!(parse_command("/voice"), Command::Voice);
        assert_eq!(parse_command("  /stop "), Command::Stop);
        assert_eq!(parse_command("/summary"), Command::Summary);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/nope"), Command::Unknown("/nope".into()));
    }

    #[test]
    fn other_lines_are_messages() {
        assert_eq!(parse_command("hello"), Command::Say("hello".into()));
        assert_eq!(
            parse_command("/ is a slash"),
            Command::Say("/ is a slash".into())
        );
        assert_eq!(parse_command(""), Command::Say("".into()));
    }

    #[tokio::test]
    async fn drain_waits_for_pending_tasks() {
        let done = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut tasks = JoinSet::new();
        for delay in [30, 10] {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                done.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            });
        }

        drain(&mut tasks).await;
        assert_eq!(done.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert!(tasks.is_empty());
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "viridian",
            "--base-url",
            "http://chat.local:5000",
            "--voice",
            "off",
        ])
        .unwrap();
        assert_eq!(args.voice, Some(VoiceArg::Off));
        assert_eq!(args.config, PathBuf::from(CONFIG_FILE_NAME));
        assert!(!args.list_microphones);
    }
}
