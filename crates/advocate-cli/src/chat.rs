//! Interactive conversation loop.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use advocate_client::HttpBackend;
use advocate_config::Config;
use advocate_core::{Notice, US_STATES};
use advocate_session::{ConversationController, Outcome};
use advocate_voice::{FileAudioDevice, SpeechOutput, Spoken, TextCleaner, VoiceCapture};
use colored::Colorize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use crate::commands;
use crate::render;
use crate::ChatArgs;

/// A parsed line of input
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Message(String),
    NewSession,
    Sessions,
    Load(String),
    Delete(String),
    State(String),
    Locate(f64, f64),
    Voice(PathBuf),
    ToggleSpeech,
    Help,
    Quit,
    Invalid(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            return Input::Quit;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Message(line.to_string());
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        match (name.to_ascii_lowercase().as_str(), rest) {
            ("new", _) => Input::NewSession,
            ("sessions", _) => Input::Sessions,
            ("load", id) if !id.is_empty() => Input::Load(id.to_string()),
            ("delete", id) if !id.is_empty() => Input::Delete(id.to_string()),
            ("state", state) if !state.is_empty() => Input::State(state.to_string()),
            ("locate", coords) => match parse_coordinates(coords) {
                Some((lat, lon)) => Input::Locate(lat, lon),
                None => Input::Invalid("Usage: /locate LAT LON".to_string()),
            },
            ("voice", file) if !file.is_empty() => Input::Voice(PathBuf::from(file)),
            ("speech", _) => Input::ToggleSpeech,
            ("help", _) => Input::Help,
            ("quit" | "exit", _) => Input::Quit,
            ("load" | "delete", _) => Input::Invalid(format!("Usage: /{} ID", name)),
            ("state", _) => Input::Invalid(format!("Known states: {}", US_STATES.join(", "))),
            ("voice", _) => Input::Invalid("Usage: /voice FILE".to_string()),
            _ => Input::Invalid(format!("Unknown command /{}; try /help", name)),
        }
    }
}

fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
    let mut parts = input.split(|c: char| c.is_whitespace() || c == ',').filter(|p| !p.is_empty());
    let lat = parts.next()?.parse().ok()?;
    let lon = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((lat, lon))
}

pub async fn run(backend: Arc<HttpBackend>, config: &Config, args: ChatArgs) -> anyhow::Result<()> {
    let controller = ConversationController::new(backend.clone(), &config.conversation);
    let mut notices = controller.notices();
    let (speech, _) = commands::speech_output(backend.clone(), config, None).await?;
    speech.set_enabled(config.voice.speech_enabled);
    let cleaner = TextCleaner::new()?;

    println!("{}", "⚖️  Legal Rights Assistant".cyan().bold());
    println!("{}", "Type /help for commands, /quit to leave".dimmed());
    println!();

    commands::place(&controller, args.state.as_deref(), args.city.as_deref());
    if let Some(id) = args.session.as_deref() {
        if controller.load_session(id).await.is_ok() {
            println!("{}", format!("Resumed session {}", id).dimmed());
        }
    }
    drain_notices(&mut notices);

    let snapshot = controller.snapshot();
    render::transcript_or_hint(&snapshot.messages, snapshot.location.has_state());

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match Input::parse(&line) {
            Input::Quit => {
                println!("{}", "👋 Goodbye!".cyan());
                break;
            }
            Input::Message(text) => ask(&controller, &speech, &text).await,
            Input::NewSession => {
                if let Ok(Outcome::Completed) = controller.create_session().await {
                    let snapshot = controller.snapshot();
                    render::transcript_or_hint(&snapshot.messages, snapshot.location.has_state());
                }
            }
            Input::Sessions => {
                if let Ok(sessions) = controller.refresh_sessions().await {
                    render::sessions(&sessions, controller.snapshot().session_id.as_deref());
                }
            }
            Input::Load(id) => {
                if let Ok(Outcome::Completed) = controller.load_session(&id).await {
                    render::transcript(&controller.snapshot().messages);
                }
            }
            Input::Delete(id) => {
                if let Ok(Outcome::Completed) = controller.delete_session(&id).await {
                    println!("{}", format!("🗑️  Deleted session {}", id).green());
                }
            }
            Input::State(name) => {
                controller.select_state(&name);
                show_welcome(&controller);
            }
            Input::Locate(lat, lon) => {
                if controller.detect_location(lat, lon).await.is_ok() {
                    show_welcome(&controller);
                }
            }
            Input::Voice(file) => {
                let device = Arc::new(FileAudioDevice::new(file));
                let mut recorder = VoiceCapture::new(backend.clone(), device, cleaner.clone());
                match recorder.record().await {
                    Ok(Some(text)) => {
                        println!("{} {}", "🎤".cyan(), text);
                        ask(&controller, &speech, &text).await;
                    }
                    Ok(None) => println!("{}", "(nothing to send)".dimmed()),
                    Err(e) => {
                        if let Some(notice) = e.notice() {
                            render::notice(&notice);
                        }
                    }
                }
            }
            Input::ToggleSpeech => {
                let state = if speech.toggle() { "on" } else { "off" };
                println!("{}", format!("🔊 Speech {}", state).dimmed());
            }
            Input::Help => render::help(),
            Input::Invalid(hint) => println!("{}", hint.yellow()),
        }

        drain_notices(&mut notices);
    }

    Ok(())
}

async fn ask(controller: &ConversationController, speech: &SpeechOutput, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    println!("{}", "Thinking...".dimmed());

    match controller.send(text).await {
        Ok(Outcome::Completed) => {
            let Some(reply) = controller.snapshot().last_reply().cloned() else {
                return;
            };
            render::message(&reply);
            match speech.speak(&reply.content).await {
                Ok(Spoken::Remote) => debug!("Reply audio saved"),
                Ok(Spoken::Local) => debug!("Reply spoken locally"),
                Ok(Spoken::Skipped) => {}
                Err(e) => debug!("Reply not spoken: {}", e),
            }
        }
        Ok(Outcome::Ignored(reason)) => debug!("Message ignored: {:?}", reason),
        Err(e) => debug!("Send failed: {}", e),
    }
}

fn show_welcome(controller: &ConversationController) {
    let snapshot = controller.snapshot();
    if snapshot.has_welcome && snapshot.messages.len() == 1 {
        render::transcript(&snapshot.messages);
    }
}

fn drain_notices(notices: &mut broadcast::Receiver<Notice>) {
    loop {
        match notices.try_recv() {
            Ok(notice) => render::notice(&notice),
            Err(TryRecvError::Lagged(skipped)) => debug!("Skipped {} notices", skipped),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
