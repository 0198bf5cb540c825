//! Linear-blend skinning.
//!
//! Forward skinning moves bind-pose data into the current pose, expressed in
//! the skinned object's local space:
//!
//! ```text
//! M(v) = root⁻¹ · Σ wᵢ · boneᵢ · bindposeᵢ
//! ```
//!
//! Reverse skinning applies `M(v)⁻¹`, so a forward pass followed by a reverse
//! pass with the same skeleton reproduces the input.

use glam::{Mat4, Vec3, Vec4};

use crate::types::{BoneWeight, SkinData, SkinStreams, SkinStreamsMut};

/// Per-bone matrices with the root transform folded in.
pub fn bone_palette(skin: &SkinData<'_>) -> Vec<Mat4> {
    let root_inv = skin.root.inverse();
    skin.bones
        .iter()
        .zip(skin.bindposes.iter())
        .map(|(bone, bindpose)| root_inv * *bone * *bindpose)
        .collect()
}

/// Blend the palette entries referenced by one vertex.
///
/// Weights are renormalized; a vertex without usable influences keeps the
/// identity so it passes through unchanged.
pub fn vertex_matrix(weight: &BoneWeight, palette: &[Mat4]) -> Mat4 {
    let mut blended = Mat4::ZERO;
    let mut total = 0.0;
    for (&bone, &w) in weight.indices.iter().zip(weight.weights.iter()) {
        if w == 0.0 {
            continue;
        }
        let Some(m) = palette.get(bone as usize) else {
            continue;
        };
        blended += *m * w;
        total += w;
    }
    if total <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    blended * (1.0 / total)
}

fn transform_tangent(m: &Mat4, t: Vec4) -> Vec4 {
    let dir = m.transform_vector3(t.truncate()).normalize_or_zero();
    dir.extend(t.w)
}

fn skin_streams(
    matrices: &[Mat4],
    src: SkinStreams<'_>,
    dst: SkinStreamsMut<'_>,
) {
    if let (Some(input), Some(output)) = (src.points, dst.points) {
        for ((o, i), m) in output.iter_mut().zip(input).zip(matrices) {
            *o = m.transform_point3(*i);
        }
    }
    if let (Some(input), Some(output)) = (src.normals, dst.normals) {
        for ((o, i), m) in output.iter_mut().zip(input).zip(matrices) {
            *o = m.transform_vector3(*i).normalize_or_zero();
        }
    }
    if let (Some(input), Some(output)) = (src.tangents, dst.tangents) {
        for ((o, i), m) in output.iter_mut().zip(input).zip(matrices) {
            *o = transform_tangent(m, *i);
        }
    }
}

/// Bind pose → current pose.
pub fn apply_skinning(skin: &SkinData<'_>, src: SkinStreams<'_>, dst: SkinStreamsMut<'_>) {
    let palette = bone_palette(skin);
    let matrices: Vec<Mat4> = skin
        .weights
        .iter()
        .map(|w| vertex_matrix(w, &palette))
        .collect();
    skin_streams(&matrices, src, dst);
}

/// Current pose → bind pose.
pub fn apply_reverse_skinning(
    skin: &SkinData<'_>,
    src: SkinStreams<'_>,
    dst: SkinStreamsMut<'_>,
) {
    let palette = bone_palette(skin);
    let matrices: Vec<Mat4> = skin
        .weights
        .iter()
        .map(|w| vertex_matrix(w, &palette).inverse())
        .collect();
    skin_streams(&matrices, src, dst);
}

/// Skin a single point, mostly useful for picking against posed data.
pub fn skin_point(skin: &SkinData<'_>, index: usize, point: Vec3) -> Vec3 {
    let palette = bone_palette(skin);
    skin.weights
        .get(index)
        .map(|w| vertex_matrix(w, &palette).transform_point3(point))
        .unwrap_or(point)
}
