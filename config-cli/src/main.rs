use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config_store::{ConfigStore, ConnectionParams, VaultStore};
use config_types::{Config, Version};
use std::io::Write;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "config-cli", about = "Fetch application configuration from Vault")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a named configuration and print it
    Get {
        /// Name of the configuration, relative to the secrets path
        name: String,

        #[arg(long, value_enum, default_value_t = Format::Env)]
        format: Format,
    },
    /// Check that the connection parameters can be resolved
    Check,
    /// Print the application version
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// KEY=value lines sorted by key
    Env,
    /// A single JSON object
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to read .env file"),
    }

    let cli = Cli::parse();
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::Get { name, format } => {
            let store = VaultStore::from_env()?;
            let config = store
                .get_config(&name)
                .await
                .with_context(|| format!("Failed to fetch configuration {name}"))?;
            stdout.write_all(render(&config, format)?.as_bytes())?;
        }
        Command::Check => {
            let params = ConnectionParams::from_env()?;
            writeln!(stdout, "address: {}", params.address)?;
            writeln!(stdout, "path: {}", params.base_path)?;
        }
        Command::Version => {
            writeln!(stdout, "{}", Version::DEFAULT)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` when set and valid, warnings otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn render(config: &Config, format: Format) -> Result<String> {
    match format {
        Format::Env => {
            let mut pairs: Vec<(&String, &String)> = config.iter().collect();
            pairs.sort();
            Ok(pairs
                .into_iter()
                .map(|(key, value)| format!("{key}={value}\n"))
                .collect())
        }
        Format::Json => {
            let mut rendered = serde_json::to_string_pretty(config)?;
            rendered.push('\n');
            Ok(rendered)
        }
    }
}
