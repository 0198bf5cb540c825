//! Tangent recalculation

use geometry::GeometryKernel;
use normalpaint_config::TangentsPrecision;
use tracing::debug;

use crate::history::HistoryPort;
use crate::skin::MeshKind;

use super::NormalEditor;

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    /// Recompute tangents with the configured precision.
    pub fn recalculate_tangents(&mut self) {
        self.recalculate_tangents_with(self.settings.tangents_precision);
    }

    /// Recompute bind-pose tangents, store them on the asset and re-pose them.
    ///
    /// `Precise` uses the asset's own generator (with handedness), `Fast`
    /// the kernel's.
    pub fn recalculate_tangents_with(&mut self, precision: TangentsPrecision) {
        match precision {
            TangentsPrecision::Precise => {
                let mut asset = self.mesh.borrow_mut();
                let bind = self.live.buffers.bind_mut();
                asset.normals.clone_from(&bind.normals);
                asset.recalculate_tangents();
                bind.tangents.clone_from(&asset.tangents);
            }
            TangentsPrecision::Fast => {
                self.kernel.generate_tangents(&mut self.live.bind_view());
                self.mesh
                    .borrow_mut()
                    .tangents
                    .clone_from(&self.live.buffers.bind().tangents);
            }
        }

        if let (MeshKind::Skinned(skin), Some((bind, posed))) =
            (&self.kind, self.live.buffers.split_mut())
        {
            skin.pose_tangents(&self.kernel, &bind.tangents, &mut posed.tangents);
        }
        debug!("Recalculated tangents ({:?})", precision);
        self.display.upload_tangents(&self.live.buffers.posed.tangents);
    }
}
