use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub download_dir: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Client for a deduplicating file-store API")]
pub struct Args {
    /// API base URL (overrides FILE_STORE_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Directory downloads are saved into (overrides FILE_STORE_DOWNLOAD_DIR)
    #[arg(long)]
    pub download_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Filter values are passed through as raw strings: they feed the draft
/// filter form verbatim and are trimmed and coerced only when the form is
/// applied, so `--min-size 0` stays the explicit constraint `min_size=0`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List uploaded files, optionally filtered
    List {
        /// Filename search term
        #[arg(long)]
        search: Option<String>,
        /// MIME type, e.g. application/pdf
        #[arg(long)]
        file_type: Option<String>,
        /// Minimum size in bytes
        #[arg(long)]
        min_size: Option<String>,
        /// Maximum size in bytes
        #[arg(long)]
        max_size: Option<String>,
        /// Uploaded on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Uploaded on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        /// "true" for reference rows only, "false" for originals only
        #[arg(long)]
        is_reference: Option<String>,
        /// Minimum reference count
        #[arg(long)]
        min_reference_count: Option<String>,
        /// Maximum reference count
        #[arg(long)]
        max_reference_count: Option<String>,
        /// Result page
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Upload a file; duplicate content becomes a reference, not an error
    Upload {
        /// Path of the file to upload
        path: PathBuf,
    },

    /// Download a file by id into the download directory
    Download {
        /// Record id
        id: String,
        /// Save under this name instead of the original filename
        #[arg(long)]
        output: Option<String>,
    },

    /// Delete a file by id
    Delete {
        /// Record id
        id: String,
    },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command.
    pub fn from_env_and_args() -> (Self, Command) {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_api =
            env::var("FILE_STORE_API_URL").unwrap_or_else(|_| "http://localhost:8000/api".into());
        let env_download = env::var("FILE_STORE_DOWNLOAD_DIR").unwrap_or_else(|_| ".".into());

        // --- Merge ---
        let cfg = Self {
            api_base_url: args.api_url.unwrap_or(env_api),
            download_dir: args.download_dir.unwrap_or(env_download),
        };

        (cfg, args.command)
    }
}
