//! Geometry provider boundary.
//!
//! A provider is an already-updated geometry object owned by an external
//! collaborator. The pipeline only reads from it.

use crate::error::ExtractError;
use crate::extract::encode_polygon_runs;
use crate::types::Channel;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Point-data channel holding texture coordinates.
pub const TEX_COORDS_CHANNEL: &str = "TCoords";

/// Read-only view of a populated geometry object.
pub trait GeometryProvider {
    /// Number of points.
    fn point_count(&self) -> usize;

    /// Position of the point at `index`.
    fn point(&self, index: usize) -> Result<Vec3, ExtractError>;

    /// Flat run-length polygon connectivity: `[k, id_0, .., id_{k-1}, k, ..]`.
    fn polygon_connectivity(&self) -> Result<Vec<i64>, ExtractError>;

    /// Names of the per-point data channels.
    fn channel_names(&self) -> Vec<String>;

    /// Per-point tuples of the named channel.
    fn channel(&self, name: &str) -> Result<Vec<Vec<f32>>, ExtractError>;

    fn has_normals(&self) -> bool;

    /// Per-point normals. Only called when [`has_normals`](Self::has_normals) is true.
    fn normals(&self) -> Result<Vec<Vec3>, ExtractError>;

    fn has_channel(&self, name: &str) -> bool {
        self.channel_names().iter().any(|n| n == name)
    }

    fn has_tex_coords(&self) -> bool {
        self.has_channel(TEX_COORDS_CHANNEL)
    }

    /// Per-point texture coordinates, read from the `TCoords` channel.
    fn tex_coords(&self) -> Result<Vec<Vec2>, ExtractError> {
        self.channel(TEX_COORDS_CHANNEL)?
            .into_iter()
            .map(|t| match t.as_slice() {
                [u, v, ..] => Ok(Vec2::new(*u, *v)),
                _ => Err(ExtractError::Provider(format!(
                    "texture coordinate with {} components",
                    t.len()
                ))),
            })
            .collect()
    }
}

/// In-memory provider, also usable as a serialized snapshot of a provider's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSource {
    pub points: Vec<Vec3>,
    /// Run-length polygon connectivity.
    #[serde(default)]
    pub polygons: Vec<i64>,
    #[serde(default)]
    pub normals: Option<Vec<Vec3>>,
    /// Named per-point channels (`RGB`, `Scalars`, `TCoords`, ...).
    #[serde(default)]
    pub point_data: BTreeMap<String, Vec<Vec<f32>>>,
}

impl MeshSource {
    /// Create a source from positions and already-encoded connectivity.
    pub fn new(points: Vec<Vec3>, polygons: Vec<i64>) -> Self {
        Self {
            points,
            polygons,
            ..Default::default()
        }
    }

    /// Create a source from positions and polygon ID lists.
    pub fn from_polygons(points: Vec<Vec3>, polygons: &[Vec<u32>]) -> Self {
        Self::new(points, encode_polygon_runs(polygons))
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_channel(mut self, name: impl Into<String>, tuples: Vec<Vec<f32>>) -> Self {
        self.point_data.insert(name.into(), tuples);
        self
    }

    /// Parse a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(json)
            .map_err(|e| ExtractError::Provider(format!("invalid mesh snapshot: {}", e)))
    }
}

impl GeometryProvider for MeshSource {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Result<Vec3, ExtractError> {
        self.points.get(index).copied().ok_or_else(|| {
            ExtractError::Provider(format!(
                "point {} requested from {} points",
                index,
                self.points.len()
            ))
        })
    }

    fn polygon_connectivity(&self) -> Result<Vec<i64>, ExtractError> {
        Ok(self.polygons.clone())
    }

    fn channel_names(&self) -> Vec<String> {
        self.point_data.keys().cloned().collect()
    }

    fn channel(&self, name: &str) -> Result<Vec<Vec<f32>>, ExtractError> {
        self.point_data.get(name).cloned().ok_or_else(|| {
            let channel = if name == TEX_COORDS_CHANNEL {
                Channel::TexCoords
            } else {
                Channel::Colors
            };
            ExtractError::MissingChannel(channel)
        })
    }

    fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    fn normals(&self) -> Result<Vec<Vec3>, ExtractError> {
        self.normals
            .clone()
            .ok_or(ExtractError::MissingChannel(Channel::Normals))
    }

    fn has_channel(&self, name: &str) -> bool {
        self.point_data.contains_key(name)
    }
}

/// Provider handle produced by a registry constructor.
pub type BoxedProvider = Box<dyn GeometryProvider + Send + Sync>;

/// Builds a provider for a source path.
pub type ProviderConstructor =
    Box<dyn Fn(&Path) -> Result<BoxedProvider, ExtractError> + Send + Sync>;

/// Maps a format tag (lower-case file extension) to a provider constructor.
#[derive(Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `tag`, replacing any previous one.
    pub fn register<F>(&mut self, tag: &str, constructor: F) -> &mut Self
    where
        F: Fn(&Path) -> Result<BoxedProvider, ExtractError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(tag.to_ascii_lowercase(), Box::new(constructor));
        self
    }

    pub fn supports(&self, tag: &str) -> bool {
        self.constructors.contains_key(&tag.to_ascii_lowercase())
    }

    /// Registered tags, sorted.
    pub fn formats(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Construct a provider for `path`, dispatching on its extension.
    pub fn open(&self, path: &Path) -> Result<BoxedProvider, ExtractError> {
        let tag = format_tag(path)
            .ok_or_else(|| ExtractError::UnsupportedSourceFormat(path.display().to_string()))?;
        let constructor = self
            .constructors
            .get(&tag)
            .ok_or_else(|| ExtractError::UnsupportedSourceFormat(tag.clone()))?;
        debug!("Opening {} with '{}' provider", path.display(), tag);
        constructor(path)
    }
}

fn format_tag(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_source() -> MeshSource {
        MeshSource::from_polygons(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            &[vec![0, 1, 2]],
        )
    }

    #[test]
    fn test_mesh_source_point_lookup() {
        let source = triangle_source();
        assert_eq!(source.point_count(), 3);
        assert_eq!(source.point(1).unwrap(), Vec3::X);
        assert!(matches!(source.point(3), Err(ExtractError::Provider(_))));
    }

    #[test]
    fn test_mesh_source_missing_channel() {
        let source = triangle_source();
        assert!(!source.has_normals());
        assert!(matches!(
            source.normals(),
            Err(ExtractError::MissingChannel(Channel::Normals))
        ));
        assert!(matches!(
            source.channel("RGB"),
            Err(ExtractError::MissingChannel(Channel::Colors))
        ));
    }

    #[test]
    fn test_tex_coords_from_channel() {
        let source = triangle_source().with_channel(
            TEX_COORDS_CHANNEL,
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        );
        assert!(source.has_tex_coords());
        let uv = source.tex_coords().unwrap();
        assert_eq!(uv[1], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_tex_coords_rejects_scalar_tuples() {
        let source = triangle_source().with_channel(TEX_COORDS_CHANNEL, vec![vec![0.5]]);
        assert!(source.tex_coords().is_err());
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "points": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            "polygons": [3, 0, 1, 2],
            "point_data": { "RGB": [[255, 0, 0], [0, 255, 0], [0, 0, 255]] }
        }"#;
        let source = MeshSource::from_json_str(json).unwrap();
        assert_eq!(source.point_count(), 3);
        assert_eq!(source.polygons, vec![3, 0, 1, 2]);
        assert_eq!(source.channel_names(), vec!["RGB".to_string()]);
        assert!(source.normals.is_none());
    }

    #[test]
    fn test_snapshot_invalid_json() {
        assert!(matches!(
            MeshSource::from_json_str("{ not json"),
            Err(ExtractError::Provider(_))
        ));
    }

    #[test]
    fn test_registry_dispatch_by_extension() {
        let mut registry = ProviderRegistry::new();
        registry.register("mesh", |_path| Ok(Box::new(triangle_source()) as BoxedProvider));

        let provider = registry.open(Path::new("scene/frame_001.MESH")).unwrap();
        assert_eq!(provider.point_count(), 3);
        assert!(registry.supports("Mesh"));
        assert_eq!(registry.formats(), vec!["mesh"]);
    }

    #[test]
    fn test_registry_unsupported_format() {
        let registry = ProviderRegistry::new();
        assert!(matches!(
            registry.open(Path::new("model.stl")),
            Err(ExtractError::UnsupportedSourceFormat(tag)) if tag == "stl"
        ));
        assert!(matches!(
            registry.open(Path::new("no_extension")),
            Err(ExtractError::UnsupportedSourceFormat(_))
        ));
    }
}
