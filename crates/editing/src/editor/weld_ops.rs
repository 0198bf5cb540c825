//! Welding against other meshes in the scene

use geometry::{GeometryKernel, WeldModel, WeldScope};
use tracing::{debug, warn};

use crate::error::EditError;
use crate::history::{HistoryPort, MeshRecord};
use crate::weld::{SceneMesh, WeldTarget};

use super::NormalEditor;

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    /// Weld coincident vertices between this mesh and `candidates`.
    ///
    /// Candidates without a usable mesh, and this editor's own mesh, are
    /// skipped. `scope` decides which side receives the welded normals.
    /// With `push_undo` the state before and after the weld is recorded,
    /// including every written target.
    ///
    /// Returns `Ok(false)` when no vertex was welded.
    pub fn apply_welding_multi(
        &mut self,
        candidates: &[SceneMesh],
        scope: WeldScope,
        angle_deg: f32,
        push_undo: bool,
    ) -> Result<bool, EditError> {
        let mut targets: Vec<WeldTarget> = candidates
            .iter()
            .filter_map(|candidate| WeldTarget::capture(&self.kernel, candidate, &self.mesh))
            .collect();
        if targets.is_empty() {
            warn!("Nothing to weld");
            return Err(EditError::NoUsableTargets);
        }

        let pre_weld = push_undo.then(|| self.live.buffers.posed.normals.clone());
        let mask = self.live.selection.has_selection();
        let welded = {
            let mut models: Vec<WeldModel<'_>> =
                targets.iter_mut().map(WeldTarget::model).collect();
            self.kernel
                .weld_multi(&mut self.live.view(), &mut models, scope, angle_deg, mask)
        };
        if welded == 0 {
            return Ok(false);
        }
        debug!(
            "Welded {} vertices against {} meshes ({:?})",
            welded,
            targets.len(),
            scope
        );

        if push_undo && scope.writes_targets() {
            let before = targets.iter().map(WeldTarget::snapshot).collect();
            self.push_undo_with(pre_weld, before);
        }

        if scope.writes_self() {
            self.update_normals(true);
        }
        let written: Vec<MeshRecord> = if scope.writes_targets() {
            targets
                .into_iter()
                .map(|target| target.write_back(&self.kernel))
                .collect()
        } else {
            Vec::new()
        };

        if push_undo {
            let normals = self.live.buffers.posed.normals.clone();
            self.push_undo_with(Some(normals), written);
        }
        Ok(true)
    }
}
