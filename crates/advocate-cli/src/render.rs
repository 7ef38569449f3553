use advocate_core::{ChatMessage, Notice, Role, SessionSummary};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;

pub fn message(message: &ChatMessage) {
    match message.role {
        Role::User => println!("{} {}", "You:".cyan().bold(), message.content),
        Role::Assistant => {
            match message.timestamp {
                Some(ts) => println!("{} {}", "Assistant:".green().bold(), clock(ts).dimmed()),
                None => println!("{}", "Assistant:".green().bold()),
            }
            println!("{}", message.content);
        }
    }
    println!();
}

pub fn transcript(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("{}", "(no messages)".dimmed());
        return;
    }
    for m in messages {
        message(m);
    }
}

/// Messages, or a prompt to pick a state when there is nothing to show yet
pub fn transcript_or_hint(messages: &[ChatMessage], has_state: bool) {
    if !messages.is_empty() {
        transcript(messages);
    } else if !has_state {
        println!("{}", "Set your state with /state NAME or /locate LAT LON".yellow());
    }
}

pub fn notice(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}", format!("❌ {}: {}", notice.title, notice.description).red());
    } else {
        println!("{}", format!("✅ {}: {}", notice.title, notice.description).green());
    }
}

pub fn sessions(sessions: &[SessionSummary], active: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No sessions yet".dimmed());
        return;
    }

    println!("{}", format!("📚 {} session(s)", sessions.len()).cyan().bold());
    for s in sessions {
        let marker = if Some(s.session_id.as_str()) == active { "*" } else { " " };
        println!(
            "{} {}  {}  {}",
            marker.green().bold(),
            s.session_id.bold(),
            format!("{} messages", s.message_count).dimmed(),
            format!("last active {}", timestamp(s.last_activity)).dimmed(),
        );
    }
}

pub fn help() {
    println!("{}", "Commands:".cyan().bold());
    for (command, description) in [
        ("/new", "start a new session"),
        ("/sessions", "list sessions"),
        ("/load ID", "switch to a stored session"),
        ("/delete ID", "delete a session"),
        ("/state NAME", "set the state whose law applies"),
        ("/locate LAT LON", "detect your location from coordinates"),
        ("/voice FILE", "ask a question recorded in an audio file"),
        ("/speech", "toggle reading replies aloud"),
        ("/help", "show this help"),
        ("/quit", "leave"),
    ] {
        println!("  {} {}", format!("{:<18}", command).bold(), description.dimmed());
    }
}

fn clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
