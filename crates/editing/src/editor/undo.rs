//! History integration for the editor

use geometry::GeometryKernel;
use glam::{Mat4, Vec3};
use normalpaint_config::TangentsUpdateMode;
use tracing::debug;

use crate::history::{HistoryPort, MeshRecord};

use super::NormalEditor;

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    /// Record the current posed normals as a new step.
    pub fn push_undo(&mut self) -> u64 {
        let normals = self.live.buffers.posed.normals.clone();
        self.push_undo_with(Some(normals), Vec::new())
    }

    /// Record a step. Tangents are refreshed in auto mode whenever normals
    /// are part of it.
    pub(crate) fn push_undo_with(
        &mut self,
        normals: Option<Vec<Vec3>>,
        records: Vec<MeshRecord>,
    ) -> u64 {
        let has_normals = normals.is_some();
        let index = self.history.push(normals, records);
        if has_normals && self.settings.tangents_mode == TangentsUpdateMode::Auto {
            self.recalculate_tangents();
        }
        index
    }

    /// Catch up with the external undo index after an undo or redo.
    ///
    /// `transform` and `bones` are the object's current placement; the skin
    /// is resynchronized with them before anything is restored, so restored
    /// normals are carried back through the current pose. The snapshot at the
    /// new index is then copied back into the live buffers
    /// without mirroring, and every recorded mesh is restored. A snapshot
    /// whose length no longer matches the mesh is skipped. Returns false
    /// when the index had not moved.
    pub fn on_undo_redo(&mut self, transform: Mat4, bones: &[Mat4]) -> bool {
        let Some(index) = self.history.poll() else {
            return false;
        };
        self.update_transform(transform, bones);

        let Some(entry) = self.history.entry(index) else {
            debug!("No snapshot at history index {}", index);
            return true;
        };
        let restored = match &entry.normals {
            Some(normals) if normals.len() == self.live.vertex_count() => {
                self.live.buffers.posed.normals.clone_from(normals);
                true
            }
            Some(normals) => {
                debug!(
                    "Snapshot at {} has {} normals, mesh has {}; skipped",
                    index,
                    normals.len(),
                    self.live.vertex_count()
                );
                false
            }
            None => false,
        };
        for record in &entry.records {
            record.restore();
        }
        debug!(
            "Restored history step {} ({} records)",
            index,
            entry.records.len()
        );

        if restored {
            self.update_normals(false);
            if self.settings.tangents_mode == TangentsUpdateMode::Auto {
                self.recalculate_tangents();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{quad_editor, skinned_quad};
    use super::*;
    use normalpaint_config::MirrorMode;

    #[test]
    fn test_history_round_trip() {
        let mut editor = quad_editor();
        editor.live.buffers.posed.normals[0] = Vec3::X;
        editor.push_undo();
        editor.live.buffers.posed.normals[0] = Vec3::Y;
        editor.push_undo();

        editor.history_mut().port_mut().undo();
        assert!(editor.on_undo_redo(Mat4::IDENTITY, &[]));
        assert_eq!(editor.normals()[0], Vec3::X);
        assert_eq!(editor.mesh().borrow().normals[0], Vec3::X);
        // Index unchanged since last look
        assert!(!editor.on_undo_redo(Mat4::IDENTITY, &[]));
    }

    #[test]
    fn test_three_pushes_three_undos() {
        let mut editor = quad_editor();
        let states = [Vec3::X, Vec3::Y, Vec3::NEG_X];
        for n in states {
            editor.live.buffers.posed.normals[0] = n;
            editor.update_normals(true);
            editor.push_undo();
        }

        for _ in 0..3 {
            assert!(editor.history_mut().port_mut().undo());
            editor.on_undo_redo(Mat4::IDENTITY, &[]);
        }
        assert_eq!(editor.normals()[0], Vec3::X);

        // Already at the oldest index
        assert!(!editor.history_mut().port_mut().undo());
        assert!(!editor.on_undo_redo(Mat4::IDENTITY, &[]));
        assert_eq!(editor.normals()[0], Vec3::X);
    }

    #[test]
    fn test_restore_does_not_mirror() {
        let mut editor = quad_editor();
        editor.live.buffers.posed.normals[0] = Vec3::Y;
        editor.push_undo();
        editor.push_undo();

        // Mirroring switched on after the snapshot was taken
        editor.settings_mut().mirror_mode = MirrorMode::LeftToRight;
        editor.history_mut().port_mut().undo();
        assert!(editor.on_undo_redo(Mat4::IDENTITY, &[]));
        assert_eq!(editor.normals()[0], Vec3::Y);
        assert_eq!(editor.normals()[1], Vec3::Z);
    }

    #[test]
    fn test_length_mismatch_skips_normals_but_replays_records() {
        let mut editor = quad_editor();
        let other = crate::asset::MeshAsset::new("other", vec![Vec3::ZERO], vec![Vec3::Z], vec![])
            .into_handle();
        editor.push_undo_with(
            Some(vec![Vec3::X; 3]),
            vec![MeshRecord::normals(&other, vec![Vec3::X])],
        );
        editor.push_undo();
        other.borrow_mut().normals[0] = Vec3::Y;

        editor.history_mut().port_mut().undo();
        assert!(editor.on_undo_redo(Mat4::IDENTITY, &[]));
        assert!(editor.normals().iter().all(|n| *n == Vec3::Z));
        assert_eq!(other.borrow().normals[0], Vec3::X);
    }

    #[test]
    fn test_auto_mode_refreshes_tangents_on_push() {
        let mut editor = quad_editor();
        editor.settings_mut().tangents_mode = TangentsUpdateMode::Auto;
        editor.live.buffers.posed.tangents.fill(glam::Vec4::ZERO);
        editor.push_undo();
        assert!(editor.tangents().iter().all(|t| t.w == 1.0));
    }

    #[test]
    fn test_restore_follows_bones_moved_since_push() {
        let mut editor = skinned_quad(Mat4::IDENTITY);
        editor.live.buffers.posed.normals[0] = Vec3::Y;
        editor.update_normals(false);
        editor.push_undo();
        editor.live.buffers.posed.normals[0] = Vec3::X;
        editor.update_normals(false);
        editor.push_undo();

        // The skeleton moves outside the editor, then the user undoes
        let bone = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
        editor.history_mut().port_mut().undo();
        assert!(editor.on_undo_redo(Mat4::IDENTITY, &[bone]));

        assert_eq!(editor.skin().unwrap().bones(), &[bone]);
        assert_eq!(editor.normals()[0], Vec3::Y);
        // Posed +Y carried back through the new bone is -Z in bind pose
        assert!(editor.bind_normals()[0].distance(Vec3::NEG_Z) < 1e-5);
        assert!(editor.mesh().borrow().normals[0].distance(Vec3::NEG_Z) < 1e-5);
    }
}
