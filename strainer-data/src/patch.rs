//! Geometry patch handed to the transport boundary.
//!
//! The patch is the flat form of a [`PackagedMesh`]: every attribute becomes
//! a contiguous float array and the triangles a flat index array.

use crate::types::PackagedMesh;
use serde::{Deserialize, Serialize};

/// Primitive topology of a patch. Packaged meshes are always triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexType {
    #[default]
    #[serde(rename = "TRIANGLES")]
    Triangles,
}

/// Opaque reference to a material owned by the remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MaterialRef(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryPatch {
    /// `x, y, z` per vertex.
    pub points: Vec<f32>,
    /// Three vertex indices per triangle.
    pub indices: Vec<u32>,
    pub index_type: IndexType,
    /// `x, y, z` per vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<f32>>,
    /// `r, g, b, a` per vertex, each in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<f32>>,
    /// `u, v` per vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<Vec<f32>>,
    pub material: MaterialRef,
}

impl GeometryPatch {
    pub fn vertex_count(&self) -> usize {
        self.points.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn flatten<T: bytemuck::Pod>(values: &[T]) -> Option<Vec<f32>> {
    (!values.is_empty()).then(|| bytemuck::cast_slice(values).to_vec())
}

impl PackagedMesh {
    /// Flatten into a transport patch bound to `material`.
    pub fn into_patch(self, material: MaterialRef) -> GeometryPatch {
        GeometryPatch {
            points: bytemuck::cast_slice(self.points.as_slice()).to_vec(),
            indices: bytemuck::cast_slice(self.triangles.as_slice()).to_vec(),
            index_type: IndexType::Triangles,
            normals: flatten(&self.normals),
            colors: flatten(&self.colors),
            textures: flatten(&self.tex_coords),
            material,
        }
    }
}
