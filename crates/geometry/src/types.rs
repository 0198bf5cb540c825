//! Buffer views and value types exchanged with the kernel.
//!
//! Every view borrows flat, caller-owned buffers for the duration of exactly
//! one kernel call. Points and normals are in the model's local space;
//! `transform` maps local space to world space.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Mesh buffers handed to a kernel operation.
pub struct ModelData<'a> {
    /// Triangle indices (3 per triangle)
    pub indices: &'a [u32],
    /// Vertex positions
    pub points: &'a [Vec3],
    /// Vertex normals (same length as points)
    pub normals: &'a mut [Vec3],
    /// Vertex tangents, w holds handedness (same length as points, or empty)
    pub tangents: &'a mut [Vec4],
    /// Vertex UVs (same length as points, or empty)
    pub uv: &'a [Vec2],
    /// Per-vertex selection weight in [0, 1] (same length as points, or empty)
    pub selection: &'a mut [f32],
    /// Local to world
    pub transform: Mat4,
}

impl ModelData<'_> {
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex position in world space
    pub fn world_point(&self, index: usize) -> Vec3 {
        self.transform.transform_point3(self.points[index])
    }

    /// Vertex normal in world space
    pub fn world_normal(&self, index: usize) -> Vec3 {
        self.transform
            .transform_vector3(self.normals[index])
            .normalize_or_zero()
    }

    /// Selection weight, or 0 when the model carries no selection
    pub fn selection_weight(&self, index: usize) -> f32 {
        self.selection.get(index).copied().unwrap_or(0.0)
    }

    /// Weight an operation applies to a vertex: its selection weight when
    /// masking, full weight otherwise.
    pub fn mask_weight(&self, index: usize, mask: bool) -> f32 {
        if mask {
            self.selection_weight(index)
        } else {
            1.0
        }
    }
}

/// Read-only mesh used as a projection source.
pub struct TargetModel<'a> {
    pub indices: &'a [u32],
    pub points: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub transform: Mat4,
}

/// Another mesh taking part in a multi-mesh weld.
pub struct WeldModel<'a> {
    pub points: &'a [Vec3],
    pub normals: &'a mut [Vec3],
    pub transform: Mat4,
}

/// Which side of a multi-mesh weld receives the welded normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WeldScope {
    /// Only the other meshes are written
    #[default]
    TargetsOnly = 0,
    /// Only the edited mesh is written
    SelfOnly = 1,
    /// Both sides are written
    Both = 2,
}

impl WeldScope {
    pub fn writes_self(&self) -> bool {
        matches!(self, WeldScope::SelfOnly | WeldScope::Both)
    }

    pub fn writes_targets(&self) -> bool {
        matches!(self, WeldScope::TargetsOnly | WeldScope::Both)
    }
}

/// Up to four bone influences for one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct BoneWeight {
    pub indices: [u32; 4],
    pub weights: [f32; 4],
}

impl BoneWeight {
    /// Fully bound to a single bone
    pub fn single(bone: u32) -> Self {
        Self {
            indices: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Two bones, `weight` going to the first
    pub fn blend(first: u32, second: u32, weight: f32) -> Self {
        Self {
            indices: [first, second, 0, 0],
            weights: [weight, 1.0 - weight, 0.0, 0.0],
        }
    }
}

/// Skeleton state for linear-blend skinning.
pub struct SkinData<'a> {
    /// Per-vertex bone influences
    pub weights: &'a [BoneWeight],
    /// Current bone local-to-world matrices
    pub bones: &'a [Mat4],
    /// Inverse bind matrices (one per bone)
    pub bindposes: &'a [Mat4],
    /// Local-to-world of the skinned object
    pub root: Mat4,
}

/// Input streams for a skinning pass. Absent streams are skipped.
#[derive(Default, Clone, Copy)]
pub struct SkinStreams<'a> {
    pub points: Option<&'a [Vec3]>,
    pub normals: Option<&'a [Vec3]>,
    pub tangents: Option<&'a [Vec4]>,
}

/// Output streams for a skinning pass. A stream is written only when both
/// its input and output are present.
#[derive(Default)]
pub struct SkinStreamsMut<'a> {
    pub points: Option<&'a mut [Vec3]>,
    pub normals: Option<&'a mut [Vec3]>,
    pub tangents: Option<&'a mut [Vec4]>,
}

/// Closest ray hit on a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the hit triangle
    pub triangle: usize,
    /// World-space distance from the ray origin
    pub distance: f32,
}

/// Summary of the current selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionSummary {
    /// Vertices with a non-zero weight
    pub count: usize,
    /// Weighted centroid in world space
    pub position: Vec3,
    /// Weighted average normal in world space
    pub normal: Vec3,
}

impl Default for SelectionSummary {
    fn default() -> Self {
        Self {
            count: 0,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
        }
    }
}

/// One brush application.
#[derive(Debug, Clone, Copy)]
pub struct BrushDab<'a> {
    /// Brush center in world space
    pub position: Vec3,
    /// Radius in world units
    pub radius: f32,
    /// Strength multiplier
    pub strength: f32,
    /// Falloff table from center (first) to rim (last)
    pub samples: &'a [f32],
}

impl BrushDab<'_> {
    /// Falloff at a world-space distance from the brush center.
    ///
    /// Zero outside the radius; linearly interpolated between samples.
    /// An empty table means constant full strength.
    pub fn falloff(&self, distance: f32) -> f32 {
        if self.radius <= 0.0 || distance > self.radius {
            return 0.0;
        }
        match self.samples.len() {
            0 => 1.0,
            1 => self.samples[0],
            len => {
                let t = (distance / self.radius) * (len - 1) as f32;
                let i = (t.floor() as usize).min(len - 2);
                let frac = t - i as f32;
                self.samples[i] + (self.samples[i + 1] - self.samples[i]) * frac
            }
        }
    }
}

/// Camera state for screen-space selection.
#[derive(Debug, Clone, Copy)]
pub struct ScreenQuery {
    /// World to clip space
    pub view_proj: Mat4,
    /// Camera position in world space
    pub camera_position: Vec3,
    /// Skip vertices whose normal faces away from the camera
    pub front_face_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falloff_interpolates_samples() {
        let samples = [1.0, 0.5, 0.0];
        let dab = BrushDab {
            position: Vec3::ZERO,
            radius: 2.0,
            strength: 1.0,
            samples: &samples,
        };
        assert!((dab.falloff(0.0) - 1.0).abs() < 1e-6);
        assert!((dab.falloff(1.0) - 0.5).abs() < 1e-6);
        assert!((dab.falloff(1.5) - 0.25).abs() < 1e-6);
        assert!(dab.falloff(2.0).abs() < 1e-6);
        assert_eq!(dab.falloff(2.5), 0.0);
    }

    #[test]
    fn test_falloff_without_samples_is_constant() {
        let dab = BrushDab {
            position: Vec3::ZERO,
            radius: 1.0,
            strength: 1.0,
            samples: &[],
        };
        assert_eq!(dab.falloff(0.9), 1.0);
    }

    #[test]
    fn test_weld_scope_targets() {
        assert!(WeldScope::TargetsOnly.writes_targets());
        assert!(!WeldScope::TargetsOnly.writes_self());
        assert!(WeldScope::SelfOnly.writes_self());
        assert!(!WeldScope::SelfOnly.writes_targets());
        assert!(WeldScope::Both.writes_self() && WeldScope::Both.writes_targets());
    }
}
