use std::path::PathBuf;
use std::sync::Arc;

use advocate_client::HttpBackend;
use advocate_config::{ConfigManager, LogLevel};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

mod chat;
mod commands;
mod config_cmd;
mod render;

#[derive(Parser)]
#[command(name = "advocate")]
#[command(about = "Ask the legal rights assistant from your terminal")]
#[command(version)]
struct Cli {
    /// Backend URL, overrides backend.base_url
    #[arg(long)]
    server_url: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path
    #[arg(long, env = "ADVOCATE_CONFIG", default_value = "~/.advocate/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation
    Chat(ChatArgs),
    /// Ask a single question and print the answer
    Ask {
        /// US state whose law applies
        #[arg(long)]
        state: String,
        #[arg(long)]
        city: Option<String>,
        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,
        question: String,
    },
    /// Manage stored sessions
    Sessions(SessionsArgs),
    /// Resolve coordinates to a city and state
    Locate {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Transcribe an audio file
    Transcribe { file: PathBuf },
    /// Read text aloud
    Speak {
        text: String,
        /// Write the synthesized audio here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Configuration management
    Config(config_cmd::ConfigArgs),
}

#[derive(Args, Clone, Default)]
pub struct ChatArgs {
    /// US state whose law applies
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    /// Resume an existing session
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args, Clone)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Clone)]
pub enum SessionCommands {
    /// List sessions known to the backend
    List,
    /// Start a new session
    New,
    /// Print a session's conversation
    Show { id: String },
    /// Delete a session
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path =
        advocate_config::expand_tilde(&cli.config).unwrap_or_else(|| PathBuf::from(&cli.config));

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    let command = match cli.command {
        Commands::Config(args) => return config_cmd::handle(args, &config_path, cli.debug).await,
        command => command,
    };

    let mut config = ConfigManager::load(&config_path).await?.snapshot().await;
    if let Some(url) = cli.server_url.as_deref() {
        config.backend.base_url = url.trim_end_matches('/').to_string();
    }
    if cli.debug {
        config.logging.level = LogLevel::Debug;
        eprintln!("{}", format!("[DEBUG] Server URL: {}", config.backend.base_url).dimmed());
    }

    let _log_guard = advocate_observability::init_logging(&config.logging)?;
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    debug!("Using backend {}", backend.base_url());

    match command {
        Commands::Chat(args) => chat::run(backend, &config, args).await,
        Commands::Ask {
            state,
            city,
            session,
            question,
        } => commands::ask(backend, &config, &state, city.as_deref(), session, &question).await,
        Commands::Sessions(args) => commands::sessions(backend, &config, args.command).await,
        Commands::Locate { lat, lon } => commands::locate(backend, &config, lat, lon).await,
        Commands::Transcribe { file } => commands::transcribe(backend, file).await,
        Commands::Speak { text, out } => commands::speak(backend, &config, &text, out).await,
        // Handled before the backend is built
        Commands::Config(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_flags() {
        let cli = Cli::try_parse_from([
            "advocate",
            "--server-url",
            "http://legal.test",
            "chat",
            "--state",
            "Texas",
            "--city",
            "Austin",
        ])
        .unwrap();
        assert_eq!(cli.server_url.as_deref(), Some("http://legal.test"));
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.state.as_deref(), Some("Texas"));
                assert_eq!(args.city.as_deref(), Some("Austin"));
                assert!(args.session.is_none());
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_locate_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["advocate", "locate", "37.77", "-122.42"]).unwrap();
        match cli.command {
            Commands::Locate { lat, lon } => {
                assert_eq!(lat, 37.77);
                assert_eq!(lon, -122.42);
            }
            _ => panic!("expected locate"),
        }
    }

    #[test]
    fn test_ask_requires_state() {
        assert!(Cli::try_parse_from(["advocate", "ask", "Can I be evicted?"]).is_err());
        let cli =
            Cli::try_parse_from(["advocate", "ask", "--state", "Ohio", "Can I be evicted?"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Ask { .. }));
    }

    #[test]
    fn test_sessions_subcommands() {
        let cli = Cli::try_parse_from(["advocate", "sessions", "delete", "s1"]).unwrap();
        match cli.command {
            Commands::Sessions(SessionsArgs {
                command: SessionCommands::Delete { id },
            }) => assert_eq!(id, "s1"),
            _ => panic!("expected sessions delete"),
        }
    }
}
