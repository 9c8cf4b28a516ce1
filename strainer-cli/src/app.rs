//! Driver wiring: logging, configuration, provider lookup and output.

use std::fs;
use std::path::{Path, PathBuf};
use strainer_data::{
    BoxedProvider, ExtractError, ExtractionStrategy, MaterialRef, MeshSource, Pipeline,
    PipelineConfig, PipelineError, ProviderRegistry,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur in the driver.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error in {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Pipeline(err.into())
    }
}

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn init_logging(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub struct RunOptions {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub scale: Option<f32>,
    pub concurrent: bool,
    pub material: u64,
    pub output: Option<PathBuf>,
}

/// Provider constructors known to the driver.
pub fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register("json", |path| {
        let text = fs::read_to_string(path)?;
        Ok(Box::new(MeshSource::from_json_str(&text)?) as BoxedProvider)
    });
    registry
}

pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, AppError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let text = fs::read_to_string(path)?;
    let config = toml::from_str(&text).map_err(|source| AppError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[tracing::instrument(skip_all, fields(input = %options.input.display()))]
pub fn run(options: RunOptions) -> Result<(), AppError> {
    let mut config = load_config(options.config.as_deref())?;
    if let Some(scale) = options.scale {
        config = config.with_scale(scale);
    }
    if options.concurrent {
        config = config.with_strategy(ExtractionStrategy::Concurrent);
    }

    let provider = registry().open(&options.input)?;
    let patch = Pipeline::new(config).run_to_patch(provider.as_ref(), MaterialRef(options.material))?;
    info!(
        "Patch ready: {} vertices, {} triangles",
        patch.vertex_count(),
        patch.triangle_count()
    );

    let json = serde_json::to_string(&patch)?;
    match options.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}
