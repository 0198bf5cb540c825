//! Mirror symmetry engine.
//!
//! The relation is built lazily from bind-pose points and base normals and
//! rebuilt when the vertex count, mirror mode or tolerance changes. Only vertices on
//! the receiving side of the plane (the side the plane normal points into)
//! keep a counterpart, and that counterpart must lie on the other side, so
//! enforcing twice gives the same result as enforcing once.

use geometry::GeometryKernel;
use glam::Vec3;
use normalpaint_config::MirrorMode;
use tracing::{debug, warn};

use crate::error::EditError;

/// Vertex-to-counterpart map for one mirror mode.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRelation {
    /// Source vertex for each vertex; unmatched vertices map to themselves
    pub indices: Vec<u32>,
    pub plane_normal: Vec3,
    pub mode: MirrorMode,
    /// Matching tolerance the relation was built with
    pub epsilon: f32,
}

impl MirrorRelation {
    /// Vertices that receive a mirrored normal.
    pub fn receivers(&self) -> usize {
        self.indices
            .iter()
            .enumerate()
            .filter(|(i, j)| *i != **j as usize)
            .count()
    }
}

#[derive(Debug, Default)]
pub struct MirrorEngine {
    relation: Option<MirrorRelation>,
}

impl MirrorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(&self) -> Option<&MirrorRelation> {
        self.relation.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.relation = None;
    }

    fn is_stale(&self, mode: MirrorMode, epsilon: f32, vertex_count: usize) -> bool {
        match &self.relation {
            Some(relation) => {
                relation.mode != mode
                    || relation.epsilon != epsilon
                    || relation.indices.len() != vertex_count
            }
            None => true,
        }
    }

    /// Copy mirrored normals across the plane.
    ///
    /// Returns `Ok(false)` when mirroring is off. When the mesh turns out not
    /// to be symmetric the relation is dropped, `mode` is reset to
    /// [`MirrorMode::None`] and [`EditError::AsymmetricMesh`] is returned
    /// with `normals` untouched.
    pub fn enforce<K: GeometryKernel + ?Sized>(
        &mut self,
        kernel: &K,
        mode: &mut MirrorMode,
        epsilon: f32,
        points: &[Vec3],
        base_normals: &[Vec3],
        normals: &mut [Vec3],
    ) -> Result<bool, EditError> {
        if !mode.is_enabled() {
            return Ok(false);
        }

        if self.is_stale(*mode, epsilon, points.len()) {
            let plane_normal = mode.plane_normal();
            let mut indices = vec![0u32; points.len()];
            let matched = kernel.build_mirror_relation(
                points,
                base_normals,
                plane_normal,
                epsilon,
                &mut indices,
            );
            if matched == 0 {
                let rejected = *mode;
                self.relation = None;
                *mode = MirrorMode::None;
                warn!("Mesh seems not symmetric under {:?}, mirroring disabled", rejected);
                return Err(EditError::AsymmetricMesh { mode: rejected });
            }

            restrict_to_receivers(&mut indices, points, plane_normal);
            let relation = MirrorRelation {
                indices,
                plane_normal,
                mode: *mode,
                epsilon,
            };
            debug!(
                "Built mirror relation for {:?}: {} matched, {} receiving",
                mode,
                matched,
                relation.receivers()
            );
            self.relation = Some(relation);
        }

        if let Some(relation) = &self.relation {
            kernel.apply_mirroring(&relation.indices, relation.plane_normal, normals);
        }
        Ok(true)
    }
}

/// Keep only mappings from the receiving side to the source side.
fn restrict_to_receivers(indices: &mut [u32], points: &[Vec3], plane_normal: Vec3) {
    for (i, slot) in indices.iter_mut().enumerate() {
        let source = *slot as usize;
        let receives = points.get(i).is_some_and(|p| p.dot(plane_normal) > 0.0);
        let from_source_side = points
            .get(source)
            .is_some_and(|p| p.dot(plane_normal) <= 0.0);
        if !(receives && from_source_side) {
            *slot = i as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::CpuKernel;
    use geometry::mirror::plane_mirror;
    use std::cell::Cell;

    /// Kernel that reports a fixed relation and counts builds.
    struct FixedRelation {
        relation: Vec<u32>,
        builds: Cell<usize>,
    }

    impl FixedRelation {
        fn new(relation: Vec<u32>) -> Self {
            Self {
                relation,
                builds: Cell::new(0),
            }
        }
    }

    impl GeometryKernel for FixedRelation {
        fn build_mirror_relation(
            &self,
            _points: &[Vec3],
            _normals: &[Vec3],
            _plane_normal: Vec3,
            _epsilon: f32,
            relation: &mut [u32],
        ) -> usize {
            self.builds.set(self.builds.get() + 1);
            relation.copy_from_slice(&self.relation);
            self.relation
                .iter()
                .enumerate()
                .filter(|(i, j)| *i != **j as usize)
                .count()
        }
    }

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_left_to_right_copies_into_right_half() {
        let kernel = FixedRelation::new(vec![1, 0, 3, 2]);
        let points = square();
        let base = vec![Vec3::Z; 4];
        let mut normals = vec![Vec3::Z; 4];
        normals[0] = Vec3::Y;

        let mut engine = MirrorEngine::new();
        let mut mode = MirrorMode::LeftToRight;
        let applied = engine
            .enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals)
            .unwrap();

        assert!(applied);
        assert_eq!(normals[0], Vec3::Y);
        assert_eq!(normals[1], plane_mirror(Vec3::Y, Vec3::X));
        assert_eq!(normals[2], Vec3::Z);
        assert_eq!(normals[3], Vec3::Z);
        assert_eq!(engine.relation().unwrap().indices, vec![0, 0, 2, 2]);
    }

    #[test]
    fn test_enforce_is_idempotent() {
        let kernel = CpuKernel::new();
        let points = square();
        let base = vec![Vec3::Z; 4];
        let mut normals = vec![
            Vec3::new(0.6, 0.8, 0.0),
            Vec3::Z,
            Vec3::new(-0.6, 0.0, 0.8),
            Vec3::NEG_Y,
        ];
        let mut engine = MirrorEngine::new();
        let mut mode = MirrorMode::LeftToRight;

        engine
            .enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals)
            .unwrap();
        let once = normals.clone();
        engine
            .enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals)
            .unwrap();
        assert_eq!(normals, once);
        assert_eq!(once[1], Vec3::new(-0.6, 0.8, 0.0));
        assert_eq!(once[3], Vec3::new(0.6, 0.0, 0.8));
    }

    #[test]
    fn test_relation_rebuilt_on_mode_or_size_change() {
        let kernel = FixedRelation::new(vec![1, 0, 3, 2]);
        let points = square();
        let base = vec![Vec3::Z; 4];
        let mut normals = vec![Vec3::Z; 4];
        let mut engine = MirrorEngine::new();

        let mut mode = MirrorMode::LeftToRight;
        engine.enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals).unwrap();
        engine.enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals).unwrap();
        assert_eq!(kernel.builds.get(), 1);

        let mut mode = MirrorMode::RightToLeft;
        engine.enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals).unwrap();
        assert_eq!(kernel.builds.get(), 2);
        // Receivers are now on the -X side
        assert_eq!(engine.relation().unwrap().indices, vec![1, 1, 3, 3]);
    }

    #[test]
    fn test_asymmetric_mesh_disables_mirroring() {
        let kernel = FixedRelation::new(vec![0, 1, 2, 3]);
        let points = square();
        let base = vec![Vec3::Z; 4];
        let mut normals = vec![Vec3::Y; 4];
        let mut engine = MirrorEngine::new();
        let mut mode = MirrorMode::LeftToRight;

        let result = engine.enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals);
        assert!(matches!(
            result,
            Err(EditError::AsymmetricMesh {
                mode: MirrorMode::LeftToRight
            })
        ));
        assert_eq!(mode, MirrorMode::None);
        assert!(engine.relation().is_none());
        assert_eq!(normals, vec![Vec3::Y; 4]);

        // Mirroring is now off
        assert!(!engine.enforce(&kernel, &mut mode, 1e-4, &points, &base, &mut normals).unwrap());
    }
}
