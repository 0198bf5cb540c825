//! Normal brushes.
//!
//! Every brush visits the vertices inside the dab radius (measured in world
//! space), weights them by the sampled falloff, the dab strength and, when
//! masking, the selection, and returns how many vertices it touched.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::{BrushDab, ModelData};

/// How the paint brush combines a normal with its base direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlendOp {
    /// Interpolate toward the base direction
    #[default]
    Lerp = 0,
    /// Add the scaled base direction
    Add = 1,
    /// Subtract the scaled base direction
    Subtract = 2,
}

/// Normalize, keeping `fallback` when the result would be degenerate.
pub(crate) fn renormalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let n = v.normalize_or_zero();
    if n == Vec3::ZERO { fallback } else { n }
}

/// Influence of a dab on every vertex, skipping vertices it does not reach.
fn dab_weights(model: &ModelData<'_>, dab: &BrushDab<'_>, mask: bool) -> Vec<(usize, f32)> {
    (0..model.vertex_count())
        .filter_map(|i| {
            let distance = model.world_point(i).distance(dab.position);
            if distance > dab.radius {
                return None;
            }
            let w = dab.falloff(distance) * dab.strength * model.mask_weight(i, mask);
            (w != 0.0).then_some((i, w))
        })
        .collect()
}

/// Paint toward (or away from) a world-space base direction.
pub fn paint(
    model: &mut ModelData<'_>,
    dab: &BrushDab<'_>,
    base_normal: Vec3,
    blend: BlendOp,
    mask: bool,
) -> usize {
    let base = model
        .transform
        .inverse()
        .transform_vector3(base_normal)
        .normalize_or_zero();
    let weights = dab_weights(model, dab, mask);
    for &(i, w) in &weights {
        let n = model.normals[i];
        let painted = match blend {
            BlendOp::Lerp => n.lerp(base, w.clamp(0.0, 1.0)),
            BlendOp::Add => n + base * w,
            BlendOp::Subtract => n - base * w,
        };
        model.normals[i] = renormalize(painted, n);
    }
    weights.len()
}

/// Blend toward a fixed local-space direction.
pub fn replace(model: &mut ModelData<'_>, dab: &BrushDab<'_>, amount: Vec3, mask: bool) -> usize {
    let target = amount.normalize_or_zero();
    let weights = dab_weights(model, dab, mask);
    for &(i, w) in &weights {
        let n = model.normals[i];
        model.normals[i] = renormalize(n.lerp(target, w.clamp(0.0, 1.0)), n);
    }
    weights.len()
}

/// Blend toward the falloff-weighted average normal under the brush.
pub fn smooth(model: &mut ModelData<'_>, dab: &BrushDab<'_>, mask: bool) -> usize {
    let weights = dab_weights(model, dab, mask);
    if weights.is_empty() {
        return 0;
    }

    let mut average = Vec3::ZERO;
    for i in 0..model.vertex_count() {
        let distance = model.world_point(i).distance(dab.position);
        average += model.normals[i] * dab.falloff(distance);
    }
    let average = average.normalize_or_zero();
    if average == Vec3::ZERO {
        return 0;
    }

    for &(i, w) in &weights {
        let n = model.normals[i];
        model.normals[i] = renormalize(n.lerp(average, w.clamp(0.0, 1.0)), n);
    }
    weights.len()
}

/// Blend back toward per-vertex base normals.
pub fn lerp_to_base(
    model: &mut ModelData<'_>,
    dab: &BrushDab<'_>,
    base_normals: &[Vec3],
    mask: bool,
) -> usize {
    let weights = dab_weights(model, dab, mask);
    let mut touched = 0;
    for &(i, w) in &weights {
        let Some(&base) = base_normals.get(i) else {
            continue;
        };
        let n = model.normals[i];
        model.normals[i] = renormalize(n.lerp(base, w.clamp(0.0, 1.0)), n);
        touched += 1;
    }
    touched
}
