//! Attribute extraction from a geometry provider.
//!
//! Pulls positions, polygon connectivity and the optional per-point channels
//! out of a provider into a [`RawGeometry`]. Missing optional channels are
//! recovered locally; malformed connectivity is an error.

use crate::error::ExtractError;
use crate::provider::GeometryProvider;
use crate::types::{Channel, RawGeometry};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Color channel names in priority order. The first one present wins.
pub const COLOR_CHANNEL_PRIORITY: [&str; 5] = ["RGB", "RGBA", "SCALARS", "Scalars", "Scalars_"];

/// How polygons that reference a nonexistent point are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexPolicy {
    /// Abort extraction with [`ExtractError::IndexOutOfRange`].
    #[default]
    Reject,
    /// Drop the offending polygon and keep going.
    SkipPolygon,
}

/// How the four extraction concerns are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    Sequential,
    /// Points, polygons, normals and colors on four scoped worker threads.
    Concurrent,
}

/// Decode run-length polygon connectivity.
///
/// Each polygon is `[k, id_0, .., id_{k-1}]`, back to back. A count field that
/// is negative or overruns the sequence is fatal: the rest of the stream
/// cannot be trusted. IDs outside `0..point_count` are handled per `policy`.
pub fn decode_polygon_runs(
    runs: &[i64],
    point_count: usize,
    policy: IndexPolicy,
) -> Result<Vec<Vec<u32>>, ExtractError> {
    let mut polygons = Vec::new();
    let mut cursor = 0;

    while cursor < runs.len() {
        let count = runs[cursor];
        let start = cursor + 1;
        let end = usize::try_from(count)
            .ok()
            .and_then(|k| start.checked_add(k))
            .filter(|&end| end <= runs.len())
            .ok_or(ExtractError::TruncatedRun {
                offset: cursor,
                count,
                len: runs.len(),
            })?;

        let polygon_index = polygons.len();
        match resolve_ids(&runs[start..end], point_count) {
            Ok(ids) => polygons.push(ids),
            Err(index) => match policy {
                IndexPolicy::Reject => {
                    return Err(ExtractError::IndexOutOfRange {
                        polygon: polygon_index,
                        index,
                        point_count,
                    });
                }
                IndexPolicy::SkipPolygon => {
                    warn!(
                        "Skipping polygon at offset {}: point {} out of range ({} points)",
                        cursor, index, point_count
                    );
                }
            },
        }

        cursor = end;
    }

    Ok(polygons)
}

/// Validate and narrow one polygon's IDs, returning the first bad ID on failure.
fn resolve_ids(ids: &[i64], point_count: usize) -> Result<Vec<u32>, i64> {
    ids.iter()
        .map(|&id| {
            usize::try_from(id)
                .ok()
                .filter(|&i| i < point_count)
                .and_then(|i| u32::try_from(i).ok())
                .ok_or(id)
        })
        .collect()
}

/// Encode polygons into the run-length connectivity format.
pub fn encode_polygon_runs(polygons: &[Vec<u32>]) -> Vec<i64> {
    let total: usize = polygons.iter().map(|p| p.len() + 1).sum();
    let mut runs = Vec::with_capacity(total);
    for polygon in polygons {
        runs.push(polygon.len() as i64);
        runs.extend(polygon.iter().map(|&id| id as i64));
    }
    runs
}

/// Reads a provider into [`RawGeometry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    strategy: ExtractionStrategy,
    index_policy: IndexPolicy,
}

impl Extractor {
    pub fn new(strategy: ExtractionStrategy, index_policy: IndexPolicy) -> Self {
        Self {
            strategy,
            index_policy,
        }
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        self.strategy
    }

    /// Extract all arrays. The provider must not be mutated while this runs.
    #[tracing::instrument(skip_all, fields(strategy = ?self.strategy))]
    pub fn extract<P>(&self, provider: &P) -> Result<RawGeometry, ExtractError>
    where
        P: GeometryProvider + Sync + ?Sized,
    {
        let raw = match self.strategy {
            ExtractionStrategy::Sequential => self.extract_sequential(provider)?,
            ExtractionStrategy::Concurrent => self.extract_concurrent(provider)?,
        };

        for channel in raw.missing_channels() {
            debug!("{}", ExtractError::MissingChannel(channel));
        }
        info!(
            "Extracted {} points, {} polygons",
            raw.points.len(),
            raw.polygon_runs.len()
        );
        Ok(raw)
    }

    fn extract_sequential<P>(&self, provider: &P) -> Result<RawGeometry, ExtractError>
    where
        P: GeometryProvider + ?Sized,
    {
        let points = read_points(provider)?;
        let polygon_runs = self.read_polygons(provider, points.len())?;
        let normals = read_normals(provider);
        let color_channel = read_color_channel(provider);
        let tex_coords = read_tex_coords(provider);

        Ok(RawGeometry {
            points,
            polygon_runs,
            normals,
            color_channel,
            tex_coords,
        })
    }

    /// Four workers against the same read-only provider, each owning one
    /// output slot. The scope end is the barrier: nothing is returned until
    /// every worker has finished.
    fn extract_concurrent<P>(&self, provider: &P) -> Result<RawGeometry, ExtractError>
    where
        P: GeometryProvider + Sync + ?Sized,
    {
        let point_count = provider.point_count();

        let (points, polygon_runs, normals, color_channel) = std::thread::scope(|s| {
            let points = s.spawn(|| read_points(provider));
            let polygons = s.spawn(|| self.read_polygons(provider, point_count));
            let normals = s.spawn(|| read_normals(provider));
            let colors = s.spawn(|| read_color_channel(provider));

            (
                join_worker(points, "points"),
                join_worker(polygons, "polygons"),
                join_worker(normals, "normals"),
                join_worker(colors, "colors"),
            )
        });

        let tex_coords = read_tex_coords(provider);

        Ok(RawGeometry {
            points: points??,
            polygon_runs: polygon_runs??,
            normals: normals?,
            color_channel: color_channel?,
            tex_coords,
        })
    }

    fn read_polygons<P>(&self, provider: &P, point_count: usize) -> Result<Vec<Vec<u32>>, ExtractError>
    where
        P: GeometryProvider + ?Sized,
    {
        let runs = provider.polygon_connectivity()?;
        decode_polygon_runs(&runs, point_count, self.index_policy)
    }
}

fn join_worker<T>(
    handle: std::thread::ScopedJoinHandle<'_, T>,
    name: &str,
) -> Result<T, ExtractError> {
    handle
        .join()
        .map_err(|_| ExtractError::Provider(format!("{} worker panicked", name)))
}

fn read_points<P>(provider: &P) -> Result<Vec<Vec3>, ExtractError>
where
    P: GeometryProvider + ?Sized,
{
    (0..provider.point_count())
        .map(|i| provider.point(i))
        .collect()
}

fn read_normals<P>(provider: &P) -> Option<Vec<Vec3>>
where
    P: GeometryProvider + ?Sized,
{
    if !provider.has_normals() {
        return None;
    }
    match provider.normals() {
        Ok(normals) if normals.len() == provider.point_count() => Some(normals),
        Ok(normals) => {
            warn!(
                "Dropping normals: {} normals for {} points",
                normals.len(),
                provider.point_count()
            );
            None
        }
        Err(e) => {
            warn!("Normals unavailable: {}", e);
            None
        }
    }
}

/// Select the first color channel present in priority order and read it.
pub fn select_color_channel<P>(provider: &P) -> Option<&'static str>
where
    P: GeometryProvider + ?Sized,
{
    let names = provider.channel_names();
    COLOR_CHANNEL_PRIORITY
        .into_iter()
        .find(|candidate| names.iter().any(|n| n == candidate))
}

fn read_color_channel<P>(provider: &P) -> Option<Vec<Vec<f32>>>
where
    P: GeometryProvider + ?Sized,
{
    let name = select_color_channel(provider)?;
    match provider.channel(name) {
        Ok(tuples) => {
            debug!("Using '{}' as color channel ({} tuples)", name, tuples.len());
            Some(tuples)
        }
        Err(e) => {
            debug!("Color channel '{}' unreadable: {}", name, e);
            None
        }
    }
}

fn read_tex_coords<P>(provider: &P) -> Option<Vec<Vec2>>
where
    P: GeometryProvider + ?Sized,
{
    if !provider.has_tex_coords() {
        return None;
    }
    match provider.tex_coords() {
        Ok(uv) if uv.len() == provider.point_count() => Some(uv),
        Ok(uv) => {
            warn!(
                "Dropping {}: {} tuples for {} points",
                Channel::TexCoords,
                uv.len(),
                provider.point_count()
            );
            None
        }
        Err(e) => {
            warn!("Texture coordinates unavailable: {}", e);
            None
        }
    }
}
