//! Core data types flowing through the pipeline.
//!
//! `RawGeometry` is what the extractor pulls out of a provider, `PackagedMesh`
//! is what the packager hands to the transport boundary. Both are created
//! fresh for one submission and owned by exactly one stage at a time.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional per-point channels a provider may or may not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Normals,
    Colors,
    TexCoords,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Normals => "normals",
            Channel::Colors => "colors",
            Channel::TexCoords => "texture coordinates",
        };
        f.write_str(name)
    }
}

/// Flat arrays extracted from a geometry provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    /// Point positions; the index is the point ID.
    pub points: Vec<Vec3>,
    /// Polygons as ordered point-ID lists. Order within a polygon is the winding.
    pub polygon_runs: Vec<Vec<u32>>,
    /// One normal per point, if the provider has a normal channel.
    pub normals: Option<Vec<Vec3>>,
    /// One 3- or 4-component tuple per point in source range (usually 0-255).
    pub color_channel: Option<Vec<Vec<f32>>>,
    /// One texture coordinate per point.
    pub tex_coords: Option<Vec<Vec2>>,
}

impl RawGeometry {
    /// Create geometry with only positions and connectivity.
    pub fn new(points: Vec<Vec3>, polygon_runs: Vec<Vec<u32>>) -> Self {
        Self {
            points,
            polygon_runs,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_color_channel(mut self, colors: Vec<Vec<f32>>) -> Self {
        self.color_channel = Some(colors);
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<Vec2>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Channels the provider did not supply.
    pub fn missing_channels(&self) -> Vec<Channel> {
        let mut missing = Vec::new();
        if self.normals.is_none() {
            missing.push(Channel::Normals);
        }
        if self.color_channel.is_none() {
            missing.push(Channel::Colors);
        }
        if self.tex_coords.is_none() {
            missing.push(Channel::TexCoords);
        }
        missing
    }
}

/// Triangle mesh with fully populated per-vertex colors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackagedMesh {
    /// Scaled copy of the extracted points.
    pub points: Vec<Vec3>,
    /// Triangles as point-ID triplets.
    pub triangles: Vec<[u32; 3]>,
    /// Pass-through normals, empty when the source had none.
    pub normals: Vec<Vec3>,
    /// RGBA colors in [0, 1], one per point.
    pub colors: Vec<Vec4>,
    /// Pass-through texture coordinates, empty when the source had none.
    pub tex_coords: Vec<Vec2>,
}

impl PackagedMesh {
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds of the points, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.points.is_empty() {
            return None;
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in &self.points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some((min, max))
    }
}
