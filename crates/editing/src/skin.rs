//! Skinning synchronizer.
//!
//! Keeps a snapshot of the skeleton and tracks whether the posed buffers are
//! still derived from it. Static meshes carry no context at all.

use geometry::{BoneWeight, GeometryKernel, SkinData, SkinStreams, SkinStreamsMut};
use glam::{Mat4, Vec3, Vec4};

use crate::buffers::VertexStreams;

/// Whether posed buffers match the observed skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Stale,
    Synced,
}

/// Skeleton snapshot and bind data for one skinned mesh.
#[derive(Debug, Clone)]
pub struct SkinContext {
    weights: Vec<BoneWeight>,
    bindposes: Vec<Mat4>,
    bones: Vec<Mat4>,
    root: Mat4,
    state: SyncState,
}

impl SkinContext {
    /// Bones beyond the bindposes are dropped, missing ones are identity.
    pub fn new(weights: Vec<BoneWeight>, bindposes: Vec<Mat4>, bones: &[Mat4], root: Mat4) -> Self {
        let bones = padded_bones(bones, bindposes.len());
        Self {
            weights,
            bindposes,
            bones,
            root,
            state: SyncState::Stale,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn bones(&self) -> &[Mat4] {
        &self.bones
    }

    pub fn root(&self) -> Mat4 {
        self.root
    }

    /// Compare against the current root and bone matrices, taking a new
    /// snapshot and going stale when anything moved. Returns whether it did.
    pub fn observe(&mut self, root: Mat4, bones: &[Mat4]) -> bool {
        let mut changed = false;
        if self.root != root {
            self.root = root;
            changed = true;
        }
        for (i, slot) in self.bones.iter_mut().enumerate() {
            let bone = bones.get(i).copied().unwrap_or(Mat4::IDENTITY);
            if *slot != bone {
                *slot = bone;
                changed = true;
            }
        }
        if changed {
            self.state = SyncState::Stale;
        }
        changed
    }

    pub fn data(&self) -> SkinData<'_> {
        SkinData {
            weights: &self.weights,
            bones: &self.bones,
            bindposes: &self.bindposes,
            root: self.root,
        }
    }

    /// Derive every posed stream from bind pose and go back to synced.
    pub fn pose_all<K: GeometryKernel + ?Sized>(
        &mut self,
        kernel: &K,
        bind: &VertexStreams,
        posed: &mut VertexStreams,
    ) {
        let skin = self.data();
        kernel.apply_skinning(
            &skin,
            SkinStreams {
                points: Some(&bind.points),
                normals: Some(&bind.normals),
                tangents: Some(&bind.tangents),
            },
            SkinStreamsMut {
                points: Some(&mut posed.points),
                normals: Some(&mut posed.normals),
                tangents: Some(&mut posed.tangents),
            },
        );
        kernel.apply_skinning(
            &skin,
            SkinStreams {
                normals: Some(&bind.normals_base),
                tangents: Some(&bind.tangents_base),
                ..Default::default()
            },
            SkinStreamsMut {
                normals: Some(&mut posed.normals_base),
                tangents: Some(&mut posed.tangents_base),
                ..Default::default()
            },
        );
        self.state = SyncState::Synced;
    }

    pub fn pose_normals<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &K,
        bind: &[Vec3],
        posed: &mut [Vec3],
    ) {
        kernel.apply_skinning(
            &self.data(),
            SkinStreams {
                normals: Some(bind),
                ..Default::default()
            },
            SkinStreamsMut {
                normals: Some(posed),
                ..Default::default()
            },
        );
    }

    pub fn unpose_normals<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &K,
        posed: &[Vec3],
        bind: &mut [Vec3],
    ) {
        kernel.apply_reverse_skinning(
            &self.data(),
            SkinStreams {
                normals: Some(posed),
                ..Default::default()
            },
            SkinStreamsMut {
                normals: Some(bind),
                ..Default::default()
            },
        );
    }

    pub fn pose_tangents<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &K,
        bind: &[Vec4],
        posed: &mut [Vec4],
    ) {
        kernel.apply_skinning(
            &self.data(),
            SkinStreams {
                tangents: Some(bind),
                ..Default::default()
            },
            SkinStreamsMut {
                tangents: Some(posed),
                ..Default::default()
            },
        );
    }

    /// Pose points and normals of a loose mesh (weld targets, projectors).
    pub fn pose_mesh<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &K,
        points: &[Vec3],
        normals: &[Vec3],
    ) -> (Vec<Vec3>, Vec<Vec3>) {
        let mut posed_points = points.to_vec();
        let mut posed_normals = normals.to_vec();
        kernel.apply_skinning(
            &self.data(),
            SkinStreams {
                points: Some(points),
                normals: Some(normals),
                ..Default::default()
            },
            SkinStreamsMut {
                points: Some(&mut posed_points),
                normals: Some(&mut posed_normals),
                ..Default::default()
            },
        );
        (posed_points, posed_normals)
    }
}

fn padded_bones(bones: &[Mat4], count: usize) -> Vec<Mat4> {
    (0..count)
        .map(|i| bones.get(i).copied().unwrap_or(Mat4::IDENTITY))
        .collect()
}

/// How the edited mesh deforms.
#[derive(Debug, Clone)]
pub enum MeshKind {
    /// Bind pose and posed buffers are the same buffer
    Static,
    Skinned(SkinContext),
}

impl MeshKind {
    pub fn is_skinned(&self) -> bool {
        matches!(self, MeshKind::Skinned(_))
    }

    pub fn skin(&self) -> Option<&SkinContext> {
        match self {
            MeshKind::Skinned(skin) => Some(skin),
            MeshKind::Static => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::CpuKernel;

    fn two_bone_skin(bones: &[Mat4]) -> SkinContext {
        SkinContext::new(
            vec![BoneWeight::single(0), BoneWeight::blend(0, 1, 0.25)],
            vec![Mat4::IDENTITY, Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))],
            bones,
            Mat4::IDENTITY,
        )
    }

    #[test]
    fn test_missing_bones_are_identity() {
        let skin = two_bone_skin(&[Mat4::from_rotation_z(0.3)]);
        assert_eq!(skin.bones().len(), 2);
        assert_eq!(skin.bones()[1], Mat4::IDENTITY);
    }

    #[test]
    fn test_observe_goes_stale_only_on_change() {
        let bones = [Mat4::IDENTITY, Mat4::IDENTITY];
        let mut skin = two_bone_skin(&bones);
        let kernel = CpuKernel::new();
        let bind =
            VertexStreams::new(vec![Vec3::ZERO, Vec3::Y], vec![Vec3::Z; 2], vec![Vec4::X; 2]);
        let mut posed = bind.clone();
        skin.pose_all(&kernel, &bind, &mut posed);
        assert_eq!(skin.state(), SyncState::Synced);

        assert!(!skin.observe(Mat4::IDENTITY, &bones));
        assert_eq!(skin.state(), SyncState::Synced);

        assert!(skin.observe(Mat4::IDENTITY, &[Mat4::IDENTITY, Mat4::from_rotation_x(0.5)]));
        assert_eq!(skin.state(), SyncState::Stale);

        let bones = [Mat4::IDENTITY, Mat4::from_rotation_x(0.5)];
        assert!(skin.observe(Mat4::from_translation(Vec3::X), &bones));
    }

    #[test]
    fn test_normals_round_trip() {
        let bones = [Mat4::from_rotation_y(0.7), Mat4::from_rotation_x(-1.1)];
        let skin = two_bone_skin(&bones);
        let kernel = CpuKernel::new();
        let bind = vec![Vec3::new(0.6, 0.8, 0.0), Vec3::new(0.0, 0.6, 0.8)];
        let mut posed = vec![Vec3::ZERO; 2];
        let mut back = vec![Vec3::ZERO; 2];
        skin.pose_normals(&kernel, &bind, &mut posed);
        skin.unpose_normals(&kernel, &posed, &mut back);
        for (a, b) in bind.iter().zip(&back) {
            assert!(a.distance(*b) < 1e-5);
        }
    }
}
