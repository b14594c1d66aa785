use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;

use super::{print_json, CommandResult, OutputFormat};
use crate::config::{Config, ConfigValue};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# nutrilog configuration

# Directory holding the local store (default: ~/.local/share/nutrilog)
# data_dir: ~/.local/share/nutrilog

# Id under which your records are stored
user_id: default

# Language used for recipe search and generation
language: en

# Open Food Facts API used for barcode lookups
# off_url: https://world.openfoodfacts.org

# Use a nutrilog-server instead of the local store
# server:
#   server_url: http://localhost:8080
#   api_key: your-api-key

# Needed for recipe generation and translated recipe search
# gemini_api_key: your-gemini-key
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => print_json(config)?,
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        print_value("data_dir", &config.data_dir.value.display(), &config.data_dir);
                        print_value("user_id", &config.user_id.value, &config.user_id);
                        print_value("language", &config.language.value, &config.language);
                        print_value("off_url", &config.off_url.value, &config.off_url);

                        match &config.server.server_url {
                            Some(url) => {
                                println!("server_url: {}", url);
                                let key = if config.server.api_key.is_some() {
                                    "set"
                                } else {
                                    "missing"
                                };
                                println!("  api_key: {}", key);
                            }
                            None => println!(
                                "server_url: (local store {})",
                                config.store_path().display()
                            ),
                        }
                        println!();

                        let gemini = if config.gemini_api_key.is_some() {
                            "set"
                        } else {
                            "not set"
                        };
                        println!("gemini_api_key: {}", gemini);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = Config::default_config_path();

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'nutrilog config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

fn print_value<T>(name: &str, shown: &dyn std::fmt::Display, value: &ConfigValue<T>) {
    println!("{}: {}", name, shown);
    println!("  source: {}", value.source);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.user_id.value, "default");
        assert_eq!(config.language.value, "en");
        assert!(config.server.server_url.is_none());
    }
}
