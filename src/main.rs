//! exmdb - Command-line client for the exmdb mail store service.
//!
//! Runs one-shot requests against a store and prints the SQLite schema of
//! either store variant.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use exmdb_client::{Client, ClientConfig};
use exmdb_protocol::WStringEncoding;
use exmdb_schema::Variant;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exmdb")]
#[command(about = "Command-line client for the exmdb mail store service")]
#[command(version)]
pub(crate) struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "EXMDB_CONFIG")]
    config: Option<PathBuf>,

    /// Server host (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Store path prefix sent with the connect handshake
    #[arg(long)]
    prefix: Option<String>,

    /// Connect to a private (user) store instead of a public one
    #[arg(long)]
    private: bool,

    /// Connect to a public (domain) store, even if configured as private
    #[arg(long, conflicts_with = "private")]
    public: bool,

    /// Encode wide strings as UTF-16LE
    #[arg(long)]
    utf16: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum StoreKind {
    Domain,
    User,
}

impl From<StoreKind> for Variant {
    fn from(kind: StoreKind) -> Self {
        match kind {
            StoreKind::Domain => Variant::Domain,
            StoreKind::User => Variant::User,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the SQLite schema of a store variant
    Schema {
        #[arg(value_enum)]
        variant: StoreKind,
    },

    /// Perform the connect handshake and report the session
    Connect,

    /// Allocate a change number in a store
    AllocateCn {
        /// Store directory on the server
        homedir: String,
    },

    /// List the subfolders of a folder
    Hierarchy {
        /// Store directory on the server
        homedir: String,

        /// Folder whose hierarchy is listed
        #[arg(short, long, default_value = "1")]
        folder_id: u64,

        /// Table flags passed to the server
        #[arg(long, default_value = "0")]
        flags: u8,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the permission rows of a folder
    Permissions {
        /// Store directory on the server
        homedir: String,

        #[arg(short, long)]
        folder_id: u64,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a folder
    CreateFolder {
        /// Store directory on the server
        homedir: String,

        /// Parent folder ID
        #[arg(long)]
        parent: u64,

        /// Display name of the new folder
        #[arg(short, long)]
        name: String,

        /// Container class, e.g. IPF.Note
        #[arg(long, default_value = "IPF.Note")]
        class: String,

        /// Optional folder comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a folder
    DeleteFolder {
        /// Store directory on the server
        homedir: String,

        folder_id: u64,
    },
}

fn load_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    // File named by --config or EXMDB_CONFIG, then EXMDB_* overrides
    let mut config = match cli.config {
        Some(ref path) => {
            let mut c = ClientConfig::from_file(path).map_err(|e| {
                tracing::error!("Failed to load config: {}", e);
                e
            })?;
            tracing::debug!("Loaded config from {}", path.display());
            c.apply_env_overrides();
            c
        }
        None => ClientConfig::from_env(),
    };

    if let Some(ref host) = cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(ref prefix) = cli.prefix {
        config.prefix = Some(prefix.clone());
    }
    if cli.private {
        config.private = Some(true);
    } else if cli.public || config.private.is_none() {
        config.private = Some(false);
    }
    if cli.utf16 {
        config = config.with_wstring_encoding(WStringEncoding::Utf16);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Schema output needs no server
    if let Commands::Schema { variant } = cli.command {
        print!("{}", commands::schema(variant.into()));
        return Ok(());
    }

    let config = load_config(&cli)?;
    let mut client = Client::new(config);

    client.connect(None, None).await.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    let result = commands::execute(&mut client, cli.command).await;
    client.disconnect().await;

    match result {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
