//! Whole-mesh and selection-driven edits

use geometry::{GeometryKernel, TargetModel};
use glam::{Quat, Vec3};
use normalpaint_config::Coordinate;
use tracing::warn;

use crate::asset::is_valid_mesh;
use crate::error::EditError;
use crate::history::HistoryPort;
use crate::weld::SceneMesh;

use super::NormalEditor;

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    /// Point selected normals at `value`, given in `frame`.
    pub fn assign(&mut self, value: Vec3, frame: Coordinate, push_undo: bool) -> usize {
        let value = self
            .live
            .to_world_vector(value, frame, self.settings.pivot_rotation)
            .normalize_or_zero();
        let count = self.kernel.assign(&mut self.live.view(), value);
        self.finish_edit(push_undo);
        count
    }

    /// Offset selected normals by `amount`, given in `frame`.
    pub fn translate(&mut self, amount: Vec3, frame: Coordinate, push_undo: bool) -> usize {
        let amount = self
            .live
            .to_world_vector(amount, frame, self.settings.pivot_rotation);
        let count = self.kernel.translate(&mut self.live.view(), amount);
        self.finish_edit(push_undo);
        count
    }

    pub fn rotate(
        &mut self,
        amount: Quat,
        pivot_rotation: Quat,
        frame: Coordinate,
        push_undo: bool,
    ) -> usize {
        let (transform, _, pivot_rotation) =
            self.live.frame_override(frame, Vec3::ZERO, pivot_rotation);
        let count = self
            .kernel
            .rotate(&mut self.live.view_with(transform), amount, pivot_rotation);
        self.finish_edit(push_undo);
        count
    }

    pub fn rotate_pivot(
        &mut self,
        amount: Quat,
        pivot_position: Vec3,
        pivot_rotation: Quat,
        frame: Coordinate,
        push_undo: bool,
    ) -> usize {
        let (transform, pivot_position, pivot_rotation) =
            self.live.frame_override(frame, pivot_position, pivot_rotation);
        let count = self.kernel.rotate_pivot(
            &mut self.live.view_with(transform),
            amount,
            pivot_position,
            pivot_rotation,
        );
        self.finish_edit(push_undo);
        count
    }

    pub fn scale(
        &mut self,
        amount: Vec3,
        pivot_position: Vec3,
        pivot_rotation: Quat,
        frame: Coordinate,
        push_undo: bool,
    ) -> usize {
        let (transform, pivot_position, pivot_rotation) =
            self.live.frame_override(frame, pivot_position, pivot_rotation);
        let count = self.kernel.scale(
            &mut self.live.view_with(transform),
            amount,
            pivot_position,
            pivot_rotation,
        );
        self.finish_edit(push_undo);
        count
    }

    /// Restore the base normals, everywhere or blended by selection weight.
    pub fn reset_normals(&mut self, use_selection: bool, push_undo: bool) {
        let posed = &mut self.live.buffers.posed;
        if use_selection {
            let weights = &self.live.selection.weights;
            for ((n, base), w) in posed.normals.iter_mut().zip(&posed.normals_base).zip(weights) {
                *n = n.lerp(*base, *w).normalize_or_zero();
            }
        } else {
            posed.normals.clone_from(&posed.normals_base);
        }
        self.finish_edit(push_undo);
    }

    /// Enforce the mirror relation on the current normals.
    pub fn apply_mirroring(&mut self, push_undo: bool) -> Result<bool, EditError> {
        let mirrored = self.sync_normals(true);
        if push_undo {
            self.push_undo();
        }
        mirrored
    }

    /// Average normals within `radius`, masked by the selection if any.
    pub fn apply_smoothing(&mut self, radius: f32, strength: f32, push_undo: bool) -> usize {
        let mask = self.live.selection.has_selection();
        let count = self.kernel.smooth(&mut self.live.view(), radius, strength, mask);
        self.finish_edit(push_undo);
        count
    }

    /// Weld coincident vertices of this mesh. Returns false when nothing
    /// was welded, in which case nothing is updated or pushed.
    pub fn apply_welding(&mut self, smoothing: bool, angle_deg: f32, push_undo: bool) -> bool {
        let mask = self.live.selection.has_selection();
        if self
            .kernel
            .weld(&mut self.live.view(), smoothing, angle_deg, mask)
            == 0
        {
            return false;
        }
        self.finish_edit(push_undo);
        true
    }

    /// Take normals from `projector` along per-vertex rays: the base
    /// normals, or the current ones. Skinned projectors are posed first.
    ///
    /// Returns the number of vertices that received a normal.
    pub fn apply_projection(
        &mut self,
        projector: &SceneMesh,
        base_normals_as_ray_direction: bool,
        push_undo: bool,
    ) -> Result<usize, EditError> {
        let Some(mesh) = projector.mesh.as_ref() else {
            warn!("Projector has no mesh");
            return Err(EditError::MissingInput("projector mesh"));
        };
        let indices = {
            let asset = mesh.borrow();
            if !is_valid_mesh(&asset) {
                return Err(EditError::InvalidMesh {
                    name: asset.name.clone(),
                });
            }
            asset.indices.clone()
        };
        let Some((points, normals, _)) = projector.posed_buffers(&self.kernel) else {
            return Err(EditError::MissingInput("projector mesh"));
        };
        let target = TargetModel {
            indices: &indices,
            points: &points,
            normals: &normals,
            transform: projector.transform,
        };

        let posed = &self.live.buffers.posed;
        let ray_dirs = if base_normals_as_ray_direction {
            posed.normals_base.clone()
        } else {
            posed.normals.clone()
        };
        let mask = self.live.selection.has_selection();
        let count = self
            .kernel
            .project_normals(&mut self.live.view(), &target, &ray_dirs, mask);
        self.finish_edit(push_undo);
        Ok(count)
    }
}
