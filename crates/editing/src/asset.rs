//! Mesh assets shared between the editor and the rest of the scene.
//!
//! The editor writes results back into the asset it edits, and weld or
//! history replay can write into other assets, so assets are shared through
//! [`MeshHandle`]. Everything runs on one thread.

use std::cell::RefCell;
use std::rc::Rc;

use geometry::BoneWeight;
use geometry::generate::uv_tangents;
use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::warn;

/// Skin binding stored with a mesh.
#[derive(Debug, Clone, Default)]
pub struct SkinBinding {
    /// Per-vertex bone influences
    pub weights: Vec<BoneWeight>,
    /// Inverse bind matrix per bone
    pub bindposes: Vec<Mat4>,
}

/// A mesh as stored in the scene.
///
/// Points, normals and tangents are in bind pose for skinned meshes.
#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: String,
    /// CPU-side data is accessible
    pub readable: bool,
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub uv: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub indices: Vec<u32>,
    pub skin: Option<SkinBinding>,
    uploads: usize,
}

pub type MeshHandle = Rc<RefCell<MeshAsset>>;

impl MeshAsset {
    pub fn new(
        name: impl Into<String>,
        points: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            readable: true,
            points,
            normals,
            indices,
            ..Default::default()
        }
    }

    pub fn with_uv(mut self, uv: Vec<Vec2>) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_tangents(mut self, tangents: Vec<Vec4>) -> Self {
        self.tangents = tangents;
        self
    }

    pub fn with_skin(mut self, skin: SkinBinding) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn into_handle(self) -> MeshHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Mark the CPU data as pushed to the GPU copy.
    pub fn upload(&mut self) {
        self.uploads += 1;
    }

    /// Number of uploads since creation
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Full tangent recomputation with handedness, in bind space.
    pub fn recalculate_tangents(&mut self) {
        self.tangents.resize(self.points.len(), Vec4::ZERO);
        uv_tangents(
            &self.indices,
            &self.points,
            &self.normals,
            &self.uv,
            &mut self.tangents,
            true,
        );
    }
}

/// Whether a mesh can take part in editing, welding or projection.
///
/// Non-readable meshes are reported with a warning.
pub fn is_valid_mesh(mesh: &MeshAsset) -> bool {
    if mesh.vertex_count() == 0 {
        return false;
    }
    if !mesh.readable {
        warn!("Mesh {} is not readable.", mesh.name);
        return false;
    }
    true
}
