//! One-shot subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use advocate_client::HttpBackend;
use advocate_config::Config;
use advocate_core::Location;
use advocate_session::{ConversationController, IgnoredReason, Outcome};
use advocate_voice::{
    local_synthesizer, FileAudioDevice, FileSink, SpeechOutput, Spoken, TextCleaner, VoiceCapture,
};
use colored::Colorize;

use crate::render;
use crate::SessionCommands;

pub async fn ask(
    backend: Arc<HttpBackend>,
    config: &Config,
    state: &str,
    city: Option<&str>,
    session: Option<String>,
    question: &str,
) -> anyhow::Result<()> {
    let controller = ConversationController::new(backend, &config.conversation);
    place(&controller, Some(state), city);
    if let Some(id) = session {
        controller.load_session(&id).await?;
    }

    match controller.send(question).await? {
        Outcome::Completed => {
            let snapshot = controller.snapshot();
            if let Some(reply) = snapshot.last_reply() {
                render::message(reply);
            }
            if let Some(id) = snapshot.session_id {
                println!("{}", format!("Session: {}", id).dimmed());
            }
            Ok(())
        }
        Outcome::Ignored(IgnoredReason::EmptyMessage) => anyhow::bail!("The question is empty"),
        Outcome::Ignored(IgnoredReason::Busy) => anyhow::bail!("Another request is in progress"),
    }
}

pub async fn sessions(
    backend: Arc<HttpBackend>,
    config: &Config,
    command: SessionCommands,
) -> anyhow::Result<()> {
    let controller = ConversationController::new(backend, &config.conversation);

    match command {
        SessionCommands::List => {
            let sessions = controller.refresh_sessions().await?;
            render::sessions(&sessions, None);
        }
        SessionCommands::New => {
            controller.create_session().await?;
            if let Some(id) = controller.snapshot().session_id {
                println!("{}", format!("✅ Created session {}", id).green());
            }
        }
        SessionCommands::Show { id } => {
            controller.load_session(&id).await?;
            println!("{}", format!("📜 Session {}", id).cyan().bold());
            println!();
            render::transcript(&controller.snapshot().messages);
        }
        SessionCommands::Delete { id } => {
            controller.delete_session(&id).await?;
            println!("{}", format!("🗑️  Deleted session {}", id).green());
        }
    }
    Ok(())
}

pub async fn locate(
    backend: Arc<HttpBackend>,
    config: &Config,
    lat: f64,
    lon: f64,
) -> anyhow::Result<()> {
    let controller = ConversationController::new(backend, &config.conversation);
    let location = controller.detect_location(lat, lon).await?;
    println!("{}", format!("📍 {}", location).green());
    Ok(())
}

pub async fn transcribe(backend: Arc<HttpBackend>, file: PathBuf) -> anyhow::Result<()> {
    let device = Arc::new(FileAudioDevice::new(file));
    let mut recorder = VoiceCapture::new(backend, device, TextCleaner::new()?);

    match recorder.record().await? {
        Some(text) => println!("{}", text),
        None => println!("{}", "(nothing to send)".dimmed()),
    }
    Ok(())
}

pub async fn speak(
    backend: Arc<HttpBackend>,
    config: &Config,
    text: &str,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (speech, path) = speech_output(backend, config, out).await?;
    match speech.speak(text).await? {
        Spoken::Remote => println!("{}", format!("🔊 Audio written to {}", path.display()).green()),
        Spoken::Local => println!("{}", "🔊 Spoken with local synthesis".green()),
        Spoken::Skipped => println!("{}", "(nothing to say)".dimmed()),
    }
    Ok(())
}

/// Apply `--state` / `--city`. State names are normalized like a picker selection.
pub fn place(controller: &ConversationController, state: Option<&str>, city: Option<&str>) {
    match (state, city) {
        (Some(state), Some(city)) => controller.set_location(Location::new(city, state.trim())),
        (Some(state), None) => controller.select_state(state),
        (None, _) => {}
    }
}

/// Speech to the configured output file (or `out`), falling back to the
/// local speech command
pub async fn speech_output(
    backend: Arc<HttpBackend>,
    config: &Config,
    out: Option<PathBuf>,
) -> anyhow::Result<(SpeechOutput, PathBuf)> {
    let path = match out {
        Some(path) => path,
        None => advocate_config::expand_tilde(&config.voice.output_file)
            .unwrap_or_else(|| PathBuf::from(&config.voice.output_file)),
    };
    ensure_parent(&path).await?;

    let speech = SpeechOutput::new(
        backend,
        Arc::new(FileSink::new(&path)),
        local_synthesizer(&config.voice.local_speech_command),
        TextCleaner::new()?,
    );
    Ok((speech, path))
}

async fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
