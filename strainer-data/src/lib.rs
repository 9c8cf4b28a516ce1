//! Strainer Data Crate
//!
//! Turns polygon-soup geometry pulled from a geometry provider into a
//! triangle-only mesh with per-vertex position, normal, color and texture
//! coordinate, ready to hand to a remote rendering session.
//! This crate does no I/O and knows nothing about the transport protocol.

pub mod color;
pub mod error;
pub mod extract;
pub mod package;
pub mod patch;
pub mod pipeline;
pub mod provider;
pub mod triangulation;
pub mod types;

pub use color::{Colormap, normalize_colors, normalize_values, synthesize_colors};
pub use error::{ExtractError, PackageError, PipelineError};
pub use extract::{
    COLOR_CHANNEL_PRIORITY, ExtractionStrategy, Extractor, IndexPolicy, decode_polygon_runs,
    encode_polygon_runs,
};
pub use package::{FallbackColoring, Packager, scale_points};
pub use patch::{GeometryPatch, IndexType, MaterialRef};
pub use pipeline::{Pipeline, PipelineConfig};
pub use provider::{BoxedProvider, GeometryProvider, MeshSource, ProviderRegistry};
pub use triangulation::{fan_triangulate, triangulate_polygons};
pub use types::{Channel, PackagedMesh, RawGeometry};
