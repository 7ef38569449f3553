use std::path::Path;

use advocate_config::{Config, ConfigManager};
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Print a config value
    Get {
        /// Dotted key, e.g. backend.base_url or voice.speech_enabled
        key: String,
    },
    /// Set a config value
    Set {
        /// Dotted key, e.g. backend.base_url or voice.speech_enabled
        key: String,
        value: String,
    },
    /// Write the default config
    Init {
        /// Overwrite an existing config
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// Print the current config
    Show,
}

pub async fn handle(args: ConfigArgs, config_path: &Path, debug: bool) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found or unset: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(config_path).await?;
            if let Err(e) = manager.update(|config| config.set_value(&key, &value)).await {
                println!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }
            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            advocate_config::init_advocate_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.to_path_buf());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            if debug {
                eprintln!("{}", format!("[DEBUG] Loaded from {:?}", manager.path()).dimmed());
            }

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
