//! r2img - photo uploader for Cloudflare R2
//!
//! Resizes images, uploads them to an R2 (or other S3-compatible) bucket and
//! prints markdown snippets pointing at the public URL.

use r2img_cli::commands::{self, Cli};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let cli = Cli::init();

    // Logs go to stderr so stdout stays clean for snippets
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
