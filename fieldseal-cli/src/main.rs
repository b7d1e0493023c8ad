//! `FieldSeal` CLI tool for key management and field operations.

#![warn(clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use fieldseal::blind_index::BlindIndexer;
use fieldseal::codec::FieldCodec;
use fieldseal::context::{EncryptionContext, IndexContext};
use fieldseal::key::Key;
use fieldseal::key_provider::{self, KeyProvider};
use fieldseal::settings::Settings;
use fieldseal_key_file::FileKeyProvider;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldseal")]
#[command(about = "FieldSeal PII field encryption CLI", long_about = None)]
struct Cli {
    /// Read the key from this file instead of PII_AES_KEY
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// TOML settings file, overridden by PII_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new field key
    Keygen {
        /// Write the key to this file (mode 0600) instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate key configuration without touching any data
    Check,
    /// Encrypt a value and print the blob as base64
    Encrypt {
        /// Plaintext to encrypt
        plaintext: String,
        #[command(flatten)]
        column: ColumnArgs,
    },
    /// Decrypt a base64 blob
    Decrypt {
        /// Blob as printed by `encrypt`
        blob: String,
        #[command(flatten)]
        column: ColumnArgs,
    },
    /// Print the hex blind index of an identity value
    BlindIndex {
        /// Identity value, normalized before hashing
        value: String,
        /// Table name
        #[arg(long)]
        table: String,
        /// Column name
        #[arg(long)]
        column: String,
    },
}

#[derive(clap::Args)]
struct ColumnArgs {
    /// Bind the blob to this table (requires --column)
    #[arg(long, requires = "column")]
    table: Option<String>,
    /// Bind the blob to this column (requires --table)
    #[arg(long, requires = "table")]
    column: Option<String>,
}

impl ColumnArgs {
    fn context(&self) -> Option<EncryptionContext> {
        match (&self.table, &self.column) {
            (Some(table), Some(column)) => Some(EncryptionContext::new(table, column)),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let Cli { key_file, config, command } = cli;

    // Key generation needs no settings
    if let Commands::Keygen { output } = command {
        return keygen(output.as_deref());
    }

    let settings = Settings::load(config.as_deref(), None).context("failed to load settings")?;
    init_tracing(&settings.log_level);
    tracing::debug!(cipher = ?settings.cipher, key_file = ?key_file, "settings loaded");

    match command {
        Commands::Keygen { .. } => {}
        Commands::Check => {
            let provider = provider(key_file, &settings)?;
            provider.load().context("key did not load")?;
            let durability = if provider.is_persistent() { "persistent" } else { "ephemeral" };
            println!("key OK ({durability}), cipher {:?}", settings.cipher);
        }
        Commands::Encrypt { plaintext, column } => {
            let codec = codec(key_file, &settings)?;
            let blob = match column.context() {
                Some(context) => codec.encrypt_in(&plaintext, &context)?,
                None => codec.encrypt(&plaintext)?,
            };
            println!("{}", STANDARD.encode(blob.as_bytes()));
        }
        Commands::Decrypt { blob, column } => {
            let codec = codec(key_file, &settings)?;
            let bytes = STANDARD.decode(blob.trim()).context("blob is not valid base64")?;
            let plaintext = match column.context() {
                Some(context) => codec.decrypt_in(&bytes, &context),
                None => codec.decrypt(&bytes),
            }
            .context("blob could not be decrypted")?;
            println!("{plaintext}");
        }
        Commands::BlindIndex { value, table, column } => {
            let key = provider(key_file, &settings)?.load().context("key did not load")?;
            let indexer = BlindIndexer::new(&key)?;
            let index = indexer.index(&value, &IndexContext::new(table, column))?;
            println!("{}", hex::encode(index));
        }
    }

    Ok(())
}

fn keygen(output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            FileKeyProvider::init(path)
                .with_context(|| format!("failed to write key to {}", path.display()))?;
            eprintln!("Wrote new key to {}", path.display());
        }
        None => println!("{}", Key::generate().export_encoded().as_str()),
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init().ok();
}

fn provider(key_file: Option<PathBuf>, settings: &Settings) -> Result<Box<dyn KeyProvider>> {
    match key_file {
        Some(path) => Ok(Box::new(
            FileKeyProvider::new(&path)
                .with_context(|| format!("key file {} unusable", path.display()))?,
        )),
        None => key_provider::from_settings(settings).context("no usable key configured"),
    }
}

fn codec(key_file: Option<PathBuf>, settings: &Settings) -> Result<FieldCodec> {
    let provider = provider(key_file, settings)?;
    FieldCodec::from_provider(provider.as_ref(), settings.cipher).context("key did not load")
}
