//! Fan triangulation of arbitrary-size polygons.
//!
//! Every polygon is split into triangles sharing its first vertex. This is
//! exact for convex polygons; non-convex input can produce overlapping or
//! inverted triangles and is not checked.

use tracing::debug;

/// Fan-triangulate a single polygon, appending to `out`.
///
/// `[v0, v1, .., v_{n-1}]` yields `(v0, v1, v2)` then `(v0, v_{i-1}, v_i)` for
/// `i` in `3..n`. Polygons with fewer than three vertices emit nothing.
pub fn fan_triangulate(polygon: &[u32], out: &mut Vec<[u32; 3]>) {
    let [v0, v1, v2, rest @ ..] = polygon else {
        return;
    };

    out.push([*v0, *v1, *v2]);
    let mut last = *v2;
    for &current in rest {
        out.push([*v0, last, current]);
        last = current;
    }
}

/// Fan-triangulate every polygon, preserving polygon order.
pub fn triangulate_polygons(polygons: &[Vec<u32>]) -> Vec<[u32; 3]> {
    let capacity: usize = polygons.iter().map(|p| p.len().saturating_sub(2)).sum();
    let mut triangles = Vec::with_capacity(capacity);
    let mut dropped = 0;

    for polygon in polygons {
        if polygon.len() < 3 {
            dropped += 1;
            continue;
        }
        fan_triangulate(polygon, &mut triangles);
    }

    debug!(
        "Triangulated {} polygons into {} triangles ({} degenerate dropped)",
        polygons.len(),
        triangles.len(),
        dropped
    );

    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan(polygon: &[u32]) -> Vec<[u32; 3]> {
        let mut out = Vec::new();
        fan_triangulate(polygon, &mut out);
        out
    }

    #[test]
    fn test_triangle_passes_through() {
        assert_eq!(fan(&[4, 7, 9]), vec![[4, 7, 9]]);
    }

    #[test]
    fn test_quad() {
        assert_eq!(fan(&[0, 1, 2, 3]), vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_pentagon() {
        assert_eq!(
            fan(&[10, 11, 12, 13, 14]),
            vec![[10, 11, 12], [10, 12, 13], [10, 13, 14]]
        );
    }

    #[test]
    fn test_fan_invariant() {
        for n in 3..12u32 {
            let polygon: Vec<u32> = (100..100 + n).collect();
            let triangles = fan(&polygon);
            assert_eq!(triangles.len(), (n - 2) as usize);
            assert!(triangles.iter().all(|t| t[0] == polygon[0]));
        }
    }

    #[test]
    fn test_degenerate_polygons_dropped() {
        assert!(fan(&[]).is_empty());
        assert!(fan(&[0]).is_empty());
        assert!(fan(&[0, 1]).is_empty());
    }

    #[test]
    fn test_triangulate_polygons_mixed() {
        let polygons = vec![vec![0, 1], vec![0, 1, 2, 3], vec![], vec![4, 5, 6]];
        let triangles = triangulate_polygons(&polygons);
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3], [4, 5, 6]]);
    }

    #[test]
    fn test_triangulate_polygons_empty() {
        assert!(triangulate_polygons(&[]).is_empty());
    }

    #[test]
    fn test_winding_preserved() {
        // Reversed input yields reversed winding.
        let triangles = triangulate_polygons(&[vec![3, 2, 1, 0]]);
        assert_eq!(triangles, vec![[3, 2, 1], [3, 1, 0]]);
    }
}
