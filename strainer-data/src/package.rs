//! Triangulation and attribute packaging.
//!
//! Consumes a [`RawGeometry`] and produces a [`PackagedMesh`]: scaled points,
//! fan-triangulated connectivity, pass-through normals and texture
//! coordinates, and one [0, 1] RGBA color per point.

use crate::color::{Colormap, normalize_colors, synthesize_colors};
use crate::error::PackageError;
use crate::triangulation::triangulate_polygons;
use crate::types::{Channel, PackagedMesh, RawGeometry};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Signal used to synthesize colors when the source has no color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackColoring {
    /// Normalized height (scaled Y coordinate) through the colormap.
    #[default]
    Height,
    /// A uniform random value per point. Not reproducible.
    Random,
}

/// Uniformly scale every coordinate of every point into a new array.
pub fn scale_points(points: &[Vec3], factor: f32) -> Vec<Vec3> {
    points.iter().map(|p| *p * factor).collect()
}

/// Turns extracted geometry into a transmission-ready mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packager {
    scale: f32,
    colormap: Colormap,
    fallback: FallbackColoring,
    compact: bool,
}

impl Default for Packager {
    fn default() -> Self {
        Self {
            scale: 1.0,
            colormap: Colormap::default(),
            fallback: FallbackColoring::default(),
            compact: false,
        }
    }
}

impl Packager {
    pub fn new() -> Self {
        Self::default()
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

    /// Drop degenerate triangles and unreferenced points after triangulation.
    pub fn with_compaction(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    #[tracing::instrument(skip_all, fields(points = raw.points.len(), polygons = raw.polygon_runs.len()))]
    pub fn package(&self, raw: RawGeometry) -> Result<PackagedMesh, PackageError> {
        let RawGeometry {
            points,
            polygon_runs,
            normals,
            color_channel,
            tex_coords,
        } = raw;

        validate_polygons(&polygon_runs, points.len())?;
        let points = scale_points(&points, self.scale);
        let triangles = triangulate_polygons(&polygon_runs);

        let normals = normals.unwrap_or_else(|| {
            debug!("{} absent upstream, leaving empty", Channel::Normals);
            Vec::new()
        });
        let colors = self.colors_for(&points, color_channel.as_deref())?;

        let mut mesh = PackagedMesh {
            points,
            triangles,
            normals,
            colors,
            tex_coords: tex_coords.unwrap_or_default(),
        };

        if self.compact {
            mesh = compact(mesh);
        }

        info!(
            "Packaged {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    fn colors_for(
        &self,
        points: &[Vec3],
        channel: Option<&[Vec<f32>]>,
    ) -> Result<Vec<Vec4>, PackageError> {
        if let Some(channel) = channel {
            let colors = normalize_colors(channel);
            if colors.len() == points.len() {
                return Ok(colors);
            }
            warn!(
                "Color channel yields {} colors for {} points, synthesizing instead",
                colors.len(),
                points.len()
            );
        }

        match self.fallback {
            FallbackColoring::Height => {
                let heights: Vec<f32> = points.iter().map(|p| p.y).collect();
                synthesize_colors(Some(&heights), points.len(), self.colormap)
            }
            FallbackColoring::Random => synthesize_colors(None, points.len(), self.colormap),
        }
    }
}

/// Every point ID must refer to an existing point.
fn validate_polygons(polygons: &[Vec<u32>], point_count: usize) -> Result<(), PackageError> {
    for (polygon, ids) in polygons.iter().enumerate() {
        if let Some(&index) = ids.iter().find(|&&id| id as usize >= point_count) {
            return Err(PackageError::IndexOutOfRange {
                polygon,
                index,
                point_count,
            });
        }
    }
    Ok(())
}

/// Remove triangles that repeat a vertex and points no triangle references.
fn compact(mesh: PackagedMesh) -> PackagedMesh {
    let triangles: Vec<[u32; 3]> = mesh
        .triangles
        .into_iter()
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    let mut remap = vec![u32::MAX; mesh.points.len()];
    let mut kept = Vec::new();
    for &id in triangles.iter().flatten() {
        let slot = &mut remap[id as usize];
        if *slot == u32::MAX {
            *slot = kept.len() as u32;
            kept.push(id as usize);
        }
    }

    let removed = mesh.points.len() - kept.len();
    if removed > 0 {
        debug!("Compaction removed {} unreferenced points", removed);
    }

    let point_count = mesh.points.len();
    PackagedMesh {
        points: pick_all(&mesh.points, &kept),
        normals: pick_parallel(mesh.normals, point_count, &kept),
        colors: pick_parallel(mesh.colors, point_count, &kept),
        tex_coords: pick_parallel(mesh.tex_coords, point_count, &kept),
        triangles: triangles
            .into_iter()
            .map(|t| t.map(|id| remap[id as usize]))
            .collect(),
    }
}

/// Remap a per-point attribute; attributes that are not per-point pass through.
fn pick_parallel<T: Copy>(values: Vec<T>, point_count: usize, kept: &[usize]) -> Vec<T> {
    if values.len() == point_count {
        pick_all(&values, kept)
    } else {
        values
    }
}

fn pick_all<T: Copy>(values: &[T], kept: &[usize]) -> Vec<T> {
    kept.iter().map(|&i| values[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn quad() -> RawGeometry {
        RawGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 4.0, 0.0),
                Vec3::new(0.0, 2.0, 6.0),
            ],
            vec![vec![0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_scale_points() {
        let scaled = scale_points(&[Vec3::new(2.0, 4.0, 6.0)], 0.5);
        assert_eq!(scaled, vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_scale_points_identity() {
        let points = vec![Vec3::new(-1.5, 0.25, 9.0)];
        assert_eq!(scale_points(&points, 1.0), points);
    }

    #[test]
    fn test_package_triangulates() {
        let mesh = Packager::new().package(quad()).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.colors.len(), 4);
        assert!(mesh.normals.is_empty());
        assert!(mesh.tex_coords.is_empty());
    }

    #[test]
    fn test_package_normalizes_color_channel() {
        let raw = quad().with_color_channel(vec![
            vec![255.0, 0.0, 0.0],
            vec![0.0, 255.0, 0.0],
            vec![0.0, 0.0, 255.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ]);
        let mesh = Packager::new().package(raw).unwrap();
        assert_eq!(mesh.colors[0], Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(mesh.colors[2], Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(mesh.colors[3], Vec4::ZERO);
    }

    #[test]
    fn test_package_height_colors_use_scaled_y() {
        // Heights 0, 0, 4, 2 normalize to 0, 0, 1, 0.5 at any scale.
        let mesh = Packager::new().with_scale(0.5).package(quad()).unwrap();
        assert_eq!(mesh.points[2], Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(mesh.colors[0], Vec4::new(0.0, 1.0, 1.0, 1.0));
        assert_eq!(mesh.colors[2], Vec4::new(1.0, 0.0, 1.0, 1.0));
        assert_eq!(mesh.colors[3], Vec4::new(0.5, 0.5, 1.0, 1.0));
    }

    #[test]
    fn test_package_flat_heights_fail() {
        let raw = RawGeometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![vec![0, 1, 2]],
        );
        let err = Packager::new().package(raw).unwrap_err();
        assert!(matches!(err, PackageError::DegenerateNormalization { value } if value == 0.0));
    }

    #[test]
    fn test_package_flat_heights_random_fallback() {
        let raw = RawGeometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![vec![0, 1, 2]],
        );
        let mesh = Packager::new()
            .with_fallback(FallbackColoring::Random)
            .package(raw)
            .unwrap();
        assert_eq!(mesh.colors.len(), 3);
        assert!(mesh.colors.iter().all(|c| c.w == 1.0));
    }

    #[test]
    fn test_package_empty() {
        let mesh = Packager::new().package(RawGeometry::default()).unwrap();
        assert!(mesh.points.is_empty());
        assert!(mesh.colors.is_empty());
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn test_package_scalar_channel_falls_back() {
        let raw = quad().with_color_channel(vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]]);
        let mesh = Packager::new().package(raw).unwrap();
        assert_eq!(mesh.colors.len(), 4);
        assert_eq!(mesh.colors[2], Vec4::new(1.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_package_passes_normals_and_uvs() {
        let raw = quad()
            .with_normals(vec![Vec3::Z; 4])
            .with_tex_coords(vec![Vec2::new(0.5, 0.5); 4]);
        let mesh = Packager::new().package(raw).unwrap();
        assert_eq!(mesh.normals, vec![Vec3::Z; 4]);
        assert_eq!(mesh.tex_coords, vec![Vec2::new(0.5, 0.5); 4]);
    }

    #[test]
    fn test_package_does_not_touch_input() {
        let raw = quad();
        let before = raw.clone();
        let _ = Packager::new().with_scale(3.0).package(raw.clone()).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_package_rejects_out_of_range_id() {
        let raw = RawGeometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 1, 7]]);
        let err = Packager::new().package(raw).unwrap_err();
        assert!(matches!(
            err,
            PackageError::IndexOutOfRange { polygon: 0, index: 7, point_count: 3 }
        ));
    }

    #[test]
    fn test_compaction_rejects_out_of_range_id() {
        let raw = RawGeometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![vec![0, 1, 2], vec![0, 1, 7]],
        );
        let err = Packager::new().with_compaction(true).package(raw).unwrap_err();
        assert!(matches!(
            err,
            PackageError::IndexOutOfRange { polygon: 1, index: 7, point_count: 3 }
        ));
    }

    #[test]
    fn test_package_rejects_id_in_degenerate_polygon() {
        // Dropped polygons are still checked.
        let raw = RawGeometry::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![vec![0, 3]]);
        assert!(matches!(
            Packager::new().package(raw),
            Err(PackageError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_compaction_removes_unused_points() {
        let raw = RawGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(9.0, 9.0, 9.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            vec![vec![0, 2, 3], vec![0, 0, 2]],
        )
        .with_normals(vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::NEG_Z]);

        let mesh = Packager::new().with_compaction(true).package(raw).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(
            mesh.points,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ]
        );
        assert_eq!(mesh.normals, vec![Vec3::X, Vec3::Z, Vec3::NEG_Z]);
        assert_eq!(mesh.colors.len(), 3);
    }
}
