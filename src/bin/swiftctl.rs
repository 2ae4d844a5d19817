//! SwiftCtl - Command line tool for a Swift object storage container
//!
//! Usage:
//!   swiftctl put <dst> <file>   - Upload a file
//!   swiftctl get <path>         - Download an object
//!   swiftctl head <path>        - Show object headers
//!   swiftctl exists <path>      - Exit 0 if the object exists, 1 otherwise

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiftstorage::{StorageClient, SwiftStorageConfig};

/// Swift Object Storage Control Tool
#[derive(Parser)]
#[command(name = "swiftctl")]
#[command(author, version, about = "Read and write objects in a Swift container", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "swiftstorage.toml")]
    config: PathBuf,

    /// Log level (overrides config; RUST_LOG overrides both)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Storage(StorageCommand),
    /// Check configuration file for errors
    CheckConfig,
    /// Write a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "swiftstorage.toml")]
        output: PathBuf,
    },
}

/// Commands that talk to the object store
#[derive(Subcommand)]
enum StorageCommand {
    /// Authenticate and show the issued storage endpoint
    Auth,
    /// Upload a local file
    Put {
        /// Destination object path inside the container
        dst: String,
        /// Local file to upload
        file: PathBuf,
    },
    /// Download an object
    Get {
        /// Object path inside the container
        path: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print an object as text
    Cat {
        /// Object path inside the container
        path: String,
    },
    /// Show object headers
    Head {
        /// Object path inside the container
        path: String,
        /// Print headers as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether an object exists (exit code 0 = yes, 1 = no)
    Exists {
        /// Object path inside the container
        path: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Init { output } => run_init(output),
        Commands::CheckConfig => check_config(&cli.config),
        Commands::Storage(command) => run_storage_command(&cli, command).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_storage_command(cli: &Cli, command: &StorageCommand) -> Result<i32> {
    let config = SwiftStorageConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    let client = StorageClient::new(config)?;

    match command {
        StorageCommand::Auth => {
            let session = client.authenticate().await?;
            println!("Storage URL: {}", session.storage_url());
            println!("Container:   {}", session.base_url());
            Ok(0)
        }
        StorageCommand::Put { dst, file } => {
            if client.put(dst, file.as_path()).await? {
                println!("Uploaded {} -> {}", file.display(), dst);
                Ok(0)
            } else {
                eprintln!("Upload of {} was not confirmed as created", dst);
                Ok(1)
            }
        }
        StorageCommand::Get { path, output } => {
            let object = client.get(path).await?;
            let written = match output {
                Some(output) => {
                    let mut file = tokio::fs::File::create(output)
                        .await
                        .with_context(|| format!("Failed to create {}", output.display()))?;
                    object.copy_to(&mut file).await?
                }
                None => object.copy_to(&mut tokio::io::stdout()).await?,
            };
            tracing::info!("Downloaded {} bytes from {}", written, path);
            Ok(0)
        }
        StorageCommand::Cat { path } => {
            println!("{}", client.get_as_string(path).await?);
            Ok(0)
        }
        StorageCommand::Head { path, json } => {
            let headers = client.headers(path).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&headers)?);
            } else {
                for (name, value) in &headers {
                    println!("{}: {}", name, value);
                }
            }
            Ok(0)
        }
        StorageCommand::Exists { path } => {
            if client.exists(path).await? {
                println!("{} exists", path);
                Ok(0)
            } else {
                println!("{} not found", path);
                Ok(1)
            }
        }
    }
}

fn check_config(path: &Path) -> Result<i32> {
    if !path.exists() {
        println!("✗ Config file not found: {}", path.display());
        return Ok(1);
    }

    match SwiftStorageConfig::from_file(path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Auth URL:        {}", config.auth.url);
            println!("  Username:        {}", config.auth.username);
            println!("  Container:       {}", if config.container().is_empty() { "(account root)" } else { config.container() });
            println!("  Auth Timeout:    {}s", config.auth.timeout_secs);
            println!("  Storage Timeout: {}s", config.storage.timeout_secs);
            Ok(0)
        }
        Err(e) => {
            println!("✗ Configuration error: {}", e);
            Ok(1)
        }
    }
}

fn run_init(output: &Path) -> Result<i32> {
    if output.exists() {
        anyhow::bail!("{} already exists, refusing to overwrite", output.display());
    }

    let config_content = r#"# SwiftStorage Configuration
# Generated configuration file

[auth]
url = "https://auth.example.com/auth/v1.0"
username = "account:user"
password = "changeme"
timeout_secs = 5

[storage]
container = "default"
timeout_secs = 10

[logging]
level = "info"
"#;

    std::fs::write(output, config_content)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("✓ Configuration written to {}", output.display());
    Ok(0)
}
