//! Extractor → Packager pipeline and its configuration.

use crate::color::Colormap;
use crate::error::PipelineError;
use crate::extract::{ExtractionStrategy, Extractor, IndexPolicy};
use crate::package::{FallbackColoring, Packager};
use crate::patch::{GeometryPatch, MaterialRef};
use crate::provider::GeometryProvider;
use crate::types::PackagedMesh;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Scale applied by the legacy submission path.
pub const LEGACY_SCALE: f32 = 0.5;

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scale: f32,
    pub colormap: Colormap,
    pub fallback: FallbackColoring,
    pub strategy: ExtractionStrategy,
    pub index_policy: IndexPolicy,
    pub compact: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            colormap: Colormap::Cool,
            fallback: FallbackColoring::Height,
            strategy: ExtractionStrategy::Sequential,
            index_policy: IndexPolicy::Reject,
            compact: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults with the half-scale used by older callers.
    pub fn legacy() -> Self {
        Self {
            scale: LEGACY_SCALE,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackColoring) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_index_policy(mut self, index_policy: IndexPolicy) -> Self {
        self.index_policy = index_policy;
        self
    }

    pub fn with_compaction(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }
}

/// Runs extraction then packaging for one geometry submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    extractor: Extractor,
    packager: Packager,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: Extractor::new(config.strategy, config.index_policy),
            packager: Packager::new()
                .with_scale(config.scale)
                .with_colormap(config.colormap)
                .with_fallback(config.fallback)
                .with_compaction(config.compact),
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn run<P>(&self, provider: &P) -> Result<PackagedMesh, PipelineError>
    where
        P: GeometryProvider + Sync + ?Sized,
    {
        let raw = self.extractor.extract(provider)?;
        let mesh = self.packager.package(raw)?;

        if let Some((min, max)) = mesh.bounds() {
            info!("Mesh bounds: {:?} .. {:?}", min, max);
        }
        Ok(mesh)
    }

    /// Run and flatten the result into a transport patch.
    pub fn run_to_patch<P>(
        &self,
        provider: &P,
        material: MaterialRef,
    ) -> Result<GeometryPatch, PipelineError>
    where
        P: GeometryProvider + Sync + ?Sized,
    {
        Ok(self.run(provider)?.into_patch(material))
    }
}
