//! Reference CPU kernel.

use glam::Vec3;
use tracing::trace;

use crate::kernel::{DEFAULT_WELD_EPSILON, GeometryKernel};
use crate::mirror;

/// Single-threaded kernel running the reference implementations.
#[derive(Debug, Clone, Copy)]
pub struct CpuKernel {
    pub weld_epsilon: f32,
}

impl Default for CpuKernel {
    fn default() -> Self {
        Self {
            weld_epsilon: DEFAULT_WELD_EPSILON,
        }
    }
}

impl CpuKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weld_epsilon(weld_epsilon: f32) -> Self {
        Self { weld_epsilon }
    }
}

impl GeometryKernel for CpuKernel {
    fn weld_epsilon(&self) -> f32 {
        self.weld_epsilon
    }

    fn build_mirror_relation(
        &self,
        points: &[Vec3],
        normals: &[Vec3],
        plane_normal: Vec3,
        epsilon: f32,
        relation: &mut [u32],
    ) -> usize {
        let matched =
            mirror::build_mirror_relation(points, normals, plane_normal, epsilon, relation);
        trace!(
            vertices = points.len(),
            matched,
            ?plane_normal,
            "Built mirror relation"
        );
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelData, WeldModel, WeldScope};
    use glam::{Mat4, Vec4};

    #[test]
    fn test_weld_epsilon_reaches_weld_multi() {
        let points = [Vec3::ZERO];
        let mut normals = [Vec3::X];
        let mut tangents: [Vec4; 0] = [];
        let mut selection: [f32; 0] = [];
        let target_points = [Vec3::new(0.01, 0.0, 0.0)];
        let mut target_normals = [Vec3::Y];

        for (epsilon, expected) in [(1e-4, 0), (0.1, 1)] {
            let kernel = CpuKernel::with_weld_epsilon(epsilon);
            let mut model = ModelData {
                indices: &[],
                points: &points,
                normals: &mut normals,
                tangents: &mut tangents,
                uv: &[],
                selection: &mut selection,
                transform: Mat4::IDENTITY,
            };
            let mut targets = [WeldModel {
                points: &target_points,
                normals: &mut target_normals,
                transform: Mat4::IDENTITY,
            }];
            let matched =
                kernel.weld_multi(&mut model, &mut targets, WeldScope::TargetsOnly, 180.0, false);
            assert_eq!(matched, expected);
        }
        assert_eq!(target_normals[0], Vec3::X);
    }

    #[test]
    fn test_default_epsilon() {
        assert_eq!(CpuKernel::new().weld_epsilon(), DEFAULT_WELD_EPSILON);
    }
}
