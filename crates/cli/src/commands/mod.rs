//! CLI definition and dispatch
//!
//! r2img is a single command: by default it uploads the given files, while
//! `--list` and `--delete` switch it to one of the bucket maintenance actions.

use std::path::PathBuf;

use clap::Parser;
use r2img_core::imaging::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use r2img_core::{Config, ObjectStore, normalize_prefix};
use r2img_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

pub mod delete;
pub mod list;
pub mod upload;

/// r2img - resize photos and upload them to Cloudflare R2
///
/// Prints a markdown snippet for every uploaded image. Credentials, bucket
/// and public URL are read from R2_* environment variables or a .env file.
#[derive(Parser, Debug)]
#[command(name = "r2img")]
#[command(author, version, about)]
pub struct Cli {
    /// Image files to upload
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Also upload every image directly inside DIR
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Folder below images/ to upload into, e.g. blog/2026-02
    #[arg(long, value_name = "FOLDER", value_parser = parse_prefix)]
    pub prefix: Option<String>,

    /// Maximum width in pixels; wider images are scaled down
    #[arg(long, value_name = "PX", default_value_t = DEFAULT_MAX_WIDTH,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// JPEG quality for resized images
    #[arg(long, value_name = "1-100", default_value_t = DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Upload original bytes without resizing
    #[arg(long)]
    pub no_resize: bool,

    /// List uploaded images instead of uploading
    #[arg(long, conflicts_with = "delete")]
    pub list: bool,

    /// Delete the object with the given key, e.g. images/photo.jpg
    #[arg(long, value_name = "KEY")]
    pub delete: Option<String>,

    /// Output format: human-readable or JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// Load `.env`, then parse arguments
    ///
    /// Variables already set in the environment take precedence over `.env`.
    pub fn init() -> Self {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
        Self::parse()
    }

    /// Output settings derived from the output flags
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            no_progress: self.no_progress,
            quiet: self.quiet,
        }
    }
}

fn parse_prefix(raw: &str) -> Result<String, String> {
    match normalize_prefix(raw) {
        Ok(Some(prefix)) => Ok(prefix),
        Ok(None) => Err("prefix must contain at least one folder name".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Execute the CLI command and return an exit code
///
/// Configuration is loaded and validated before any file is touched.
pub async fn execute(cli: Cli) -> ExitCode {
    let formatter = Formatter::new(cli.output_config());

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };
    tracing::debug!(?config, "loaded configuration");

    let client = match S3Client::new(&config).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from(&e);
        }
    };

    run(&cli, &config, &client, &formatter).await
}

/// Run the requested action against an already configured store
pub async fn run<S>(cli: &Cli, config: &Config, store: &S, formatter: &Formatter) -> ExitCode
where
    S: ObjectStore + ?Sized,
{
    if cli.list {
        return list::execute(store, formatter).await;
    }

    if let Some(key) = &cli.delete {
        return delete::execute(store, key, formatter).await;
    }

    upload::execute(cli, config, store, formatter).await
}
