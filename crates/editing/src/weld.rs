//! Weld aggregator.
//!
//! Other meshes in the scene are captured into transient [`WeldTarget`]s:
//! their own copies of points and normals, posed when the mesh is skinned.
//! After the kernel weld the copies are unposed and written back onto the
//! target assets.

use std::rc::Rc;

use geometry::{GeometryKernel, WeldModel};
use glam::{Mat4, Vec3};
use tracing::warn;

use crate::asset::{MeshHandle, is_valid_mesh};
use crate::history::MeshRecord;
use crate::skin::SkinContext;

/// A mesh placed in the scene, as seen by weld and projection.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    /// `None` when the object has no mesh attached
    pub mesh: Option<MeshHandle>,
    /// Local to world
    pub transform: Mat4,
    /// Current bone matrices when the object is skinned
    pub bones: Option<Vec<Mat4>>,
}

impl SceneMesh {
    pub fn new(mesh: MeshHandle, transform: Mat4) -> Self {
        Self {
            mesh: Some(mesh),
            transform,
            bones: None,
        }
    }

    pub fn skinned(mesh: MeshHandle, transform: Mat4, bones: Vec<Mat4>) -> Self {
        Self {
            mesh: Some(mesh),
            transform,
            bones: Some(bones),
        }
    }

    /// An object without a mesh.
    pub fn empty(transform: Mat4) -> Self {
        Self {
            mesh: None,
            transform,
            bones: None,
        }
    }

    /// Skin context when both the object and its mesh are skinned.
    pub(crate) fn skin_context(&self) -> Option<SkinContext> {
        let mesh = self.mesh.as_ref()?.borrow();
        let binding = mesh.skin.as_ref()?;
        let bones = self.bones.as_deref()?;
        Some(SkinContext::new(
            binding.weights.clone(),
            binding.bindposes.clone(),
            bones,
            self.transform,
        ))
    }

    /// Posed copies of the mesh points and normals, in the object's local space.
    pub(crate) fn posed_buffers<K: GeometryKernel + ?Sized>(
        &self,
        kernel: &K,
    ) -> Option<(Vec<Vec3>, Vec<Vec3>, Option<SkinContext>)> {
        let skin = self.skin_context();
        let mesh = self.mesh.as_ref()?.borrow();
        let (points, normals) = match &skin {
            Some(skin) => skin.pose_mesh(kernel, &mesh.points, &mesh.normals),
            None => (mesh.points.clone(), mesh.normals.clone()),
        };
        Some((points, normals, skin))
    }
}

/// One participating mesh for the duration of a weld.
pub struct WeldTarget {
    mesh: MeshHandle,
    transform: Mat4,
    points: Vec<Vec3>,
    normals: Vec<Vec3>,
    skin: Option<SkinContext>,
}

impl WeldTarget {
    /// Capture a candidate, skipping missing meshes, the edited mesh itself
    /// and meshes that are not usable.
    pub fn capture<K: GeometryKernel + ?Sized>(
        kernel: &K,
        candidate: &SceneMesh,
        own: &MeshHandle,
    ) -> Option<Self> {
        let mesh = candidate.mesh.as_ref()?;
        if Rc::ptr_eq(mesh, own) {
            return None;
        }
        {
            let asset = mesh.borrow();
            if !is_valid_mesh(&asset) {
                return None;
            }
            if asset.normals.len() != asset.points.len() {
                warn!("Mesh {} has no usable normals, skipped", asset.name);
                return None;
            }
        }
        let (points, normals, skin) = candidate.posed_buffers(kernel)?;
        Some(Self {
            mesh: mesh.clone(),
            transform: candidate.transform,
            points,
            normals,
            skin,
        })
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }

    /// Kernel view over the captured copies.
    pub fn model(&mut self) -> WeldModel<'_> {
        WeldModel {
            points: &self.points,
            normals: &mut self.normals,
            transform: self.transform,
        }
    }

    /// The target's normals as currently stored on the asset.
    pub fn snapshot(&self) -> MeshRecord {
        MeshRecord::normals(&self.mesh, self.mesh.borrow().normals.clone())
    }

    /// Unpose the welded normals, store them on the asset and upload.
    /// Returns a record of what was written.
    pub fn write_back<K: GeometryKernel + ?Sized>(self, kernel: &K) -> MeshRecord {
        let normals = match &self.skin {
            Some(skin) => {
                let mut bind = self.normals.clone();
                skin.unpose_normals(kernel, &self.normals, &mut bind);
                bind
            }
            None => self.normals,
        };
        {
            let mut asset = self.mesh.borrow_mut();
            asset.normals.clone_from(&normals);
            asset.upload();
        }
        MeshRecord::normals(&self.mesh, normals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MeshAsset, SkinBinding};
    use geometry::{BoneWeight, CpuKernel};

    fn single_vertex(name: &str, normal: Vec3) -> MeshHandle {
        MeshAsset::new(name, vec![Vec3::ZERO], vec![normal], vec![]).into_handle()
    }

    #[test]
    fn test_capture_filters_candidates() {
        let kernel = CpuKernel::new();
        let own = single_vertex("own", Vec3::Z);
        let other = single_vertex("other", Vec3::Z);
        let hidden = single_vertex("hidden", Vec3::Z);
        hidden.borrow_mut().readable = false;

        let capture = |mesh: SceneMesh| WeldTarget::capture(&kernel, &mesh, &own).is_some();
        assert!(!capture(SceneMesh::empty(Mat4::IDENTITY)));
        assert!(!capture(SceneMesh::new(own.clone(), Mat4::IDENTITY)));
        assert!(!capture(SceneMesh::new(hidden, Mat4::IDENTITY)));
        assert!(capture(SceneMesh::new(other, Mat4::IDENTITY)));
    }

    #[test]
    fn test_skinned_target_round_trips_through_pose() {
        let kernel = CpuKernel::new();
        let own = single_vertex("own", Vec3::Z);
        let mesh = MeshAsset::new("arm", vec![Vec3::X], vec![Vec3::Z], vec![])
            .with_skin(SkinBinding {
                weights: vec![BoneWeight::single(0)],
                bindposes: vec![Mat4::IDENTITY],
            })
            .into_handle();
        let bone = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let candidate = SceneMesh::skinned(mesh.clone(), Mat4::IDENTITY, vec![bone]);

        let mut target = WeldTarget::capture(&kernel, &candidate, &own).unwrap();
        assert!(target.is_skinned());
        // Posed normal is the bind normal rotated by the bone
        let posed = target.model().normals[0];
        assert!(posed.distance(Vec3::NEG_Y) < 1e-5);

        let record = target.write_back(&kernel);
        assert!(mesh.borrow().normals[0].distance(Vec3::Z) < 1e-5);
        assert_eq!(record.normals.as_ref().map(Vec::len), Some(1));
        assert_eq!(mesh.borrow().upload_count(), 1);
    }
}
