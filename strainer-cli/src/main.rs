//! Strainer
//!
//! Loads a geometry snapshot, runs it through the extraction and packaging
//! pipeline and prints the resulting triangle patch as JSON.

mod app;

use clap::Parser;
use std::path::PathBuf;

/// Strainer - polygon soup to triangle patch
#[derive(Parser, Debug)]
#[command(name = "strainer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Geometry snapshot to load
    input: PathBuf,

    /// Pipeline configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Uniform point scale, overrides the config file
    #[arg(short, long)]
    scale: Option<f32>,

    /// Extract channels on parallel workers
    #[arg(long)]
    concurrent: bool,

    /// Material id attached to the patch
    #[arg(short, long, default_value_t = 0)]
    material: u64,

    /// Write the patch here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    app::init_logging(&app::LoggingConfig {
        level: args.log_level.clone(),
    });

    let options = app::RunOptions {
        input: args.input,
        config: args.config,
        scale: args.scale,
        concurrent: args.concurrent,
        material: args.material,
        output: args.output,
    };

    if let Err(e) = app::run(options) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
