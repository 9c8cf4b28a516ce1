//! Per-point color normalization and synthesis.

use crate::error::PackageError;
use glam::{Vec3, Vec4};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source color channels are 8-bit.
const CHANNEL_MAX: f32 = 255.0;

/// Inferno sampled at t = 0, 0.25, 0.5, 0.75, 1.
const INFERNO_STOPS: [Vec3; 5] = [
    Vec3::new(0.001462, 0.000466, 0.013866),
    Vec3::new(0.341500, 0.062325, 0.429425),
    Vec3::new(0.735683, 0.215906, 0.330245),
    Vec3::new(0.978422, 0.557937, 0.034931),
    Vec3::new(0.988362, 0.998364, 0.644924),
];

/// Continuous colormap over the unit interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Cyan to magenta: `(t, 1 - t, 1)`.
    #[default]
    Cool,
    /// Black through red and orange to pale yellow.
    Inferno,
}

impl Colormap {
    /// Map `t` (clamped to [0, 1]) to an RGB color.
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Colormap::Cool => Vec3::new(t, 1.0 - t, 1.0),
            Colormap::Inferno => {
                let scaled = t * (INFERNO_STOPS.len() - 1) as f32;
                let lo = (scaled.floor() as usize).min(INFERNO_STOPS.len() - 2);
                INFERNO_STOPS[lo].lerp(INFERNO_STOPS[lo + 1], scaled - lo as f32)
            }
        }
    }

    /// Map `t` to an opaque RGBA color with channels rounded to three decimals.
    pub fn sample_rgba(&self, t: f32) -> Vec4 {
        let rgb = (self.sample(t) * 1000.0).round() / 1000.0;
        rgb.extend(1.0)
    }
}

/// Map source-range color tuples into [0, 1] RGBA.
///
/// Three-component tuples get an alpha of 1.0; four-component tuples have
/// their alpha scaled too. Tuples of any other length are skipped.
pub fn normalize_colors(channel: &[Vec<f32>]) -> Vec<Vec4> {
    let mut colors = Vec::with_capacity(channel.len());
    for tuple in channel {
        match tuple.as_slice() {
            [r, g, b] => colors.push(Vec4::new(*r, *g, *b, CHANNEL_MAX) / CHANNEL_MAX),
            [r, g, b, a] => colors.push(Vec4::new(*r, *g, *b, *a) / CHANNEL_MAX),
            _ => {}
        }
    }

    let skipped = channel.len() - colors.len();
    if skipped > 0 {
        debug!("Skipped {} color tuples with unsupported component counts", skipped);
    }
    colors
}

/// Min-max rescale `values` into [0, 1].
///
/// An empty slice yields an empty result; a constant slice has no range and
/// is rejected.
pub fn normalize_values(values: &[f32]) -> Result<Vec<f32>, PackageError> {
    let Some(&first) = values.first() else {
        return Ok(Vec::new());
    };

    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if range == 0.0 {
        return Err(PackageError::DegenerateNormalization { value: min });
    }

    Ok(values.iter().map(|v| (v - min) / range).collect())
}

/// Synthesize one color per point.
///
/// With `values`, each value is min-max normalized and mapped through
/// `colormap`. Without, every point draws a uniform random value instead, so
/// the output differs between runs.
pub fn synthesize_colors(
    values: Option<&[f32]>,
    count: usize,
    colormap: Colormap,
) -> Result<Vec<Vec4>, PackageError> {
    synthesize_colors_with(values, count, colormap, &mut rand::thread_rng())
}

/// [`synthesize_colors`] with a caller-supplied random source.
pub fn synthesize_colors_with<R: Rng + ?Sized>(
    values: Option<&[f32]>,
    count: usize,
    colormap: Colormap,
    rng: &mut R,
) -> Result<Vec<Vec4>, PackageError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let normalized = match values {
        Some(values) => normalize_values(values)?,
        None => {
            debug!("No value signal, coloring {} points randomly", count);
            (0..count).map(|_| rng.r#gen::<f32>()).collect()
        }
    };

    Ok(normalized
        .into_iter()
        .map(|t| colormap.sample_rgba(t))
        .collect())
}
