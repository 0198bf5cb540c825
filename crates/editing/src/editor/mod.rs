//! Normal editing session
//!
//! [`NormalEditor`] owns everything one edited mesh needs:
//! - the live posed (and, when skinned, bind-pose) buffers
//! - the skin snapshot used to move normals between the two spaces
//! - the mirror relation
//! - history snapshots keyed by an external undo index
//!
//! Mutating operations share one flow: the kernel edits the posed buffers,
//! [`NormalEditor::update_normals`] carries the result back to bind pose,
//! mirrors it, writes it to the mesh asset and uploads it, and finally the
//! caller may push a history step.

mod bake_ops;
mod brush_ops;
mod selection_ops;
mod tangents;
mod transform_ops;
mod undo;
mod weld_ops;

use geometry::GeometryKernel;
use glam::{Mat4, Vec3, Vec4};
use normalpaint_config::{EditorSettings, TangentsUpdateMode};
use tracing::{debug, info, warn};

use crate::asset::{MeshHandle, is_valid_mesh};
use crate::buffers::{BufferSet, LiveModel, VertexStreams};
use crate::display::{AssetWriter, DisplaySink, FsWriter, NullDisplay};
use crate::error::EditError;
use crate::history::{HistoryManager, HistoryPort};
use crate::mirror::MirrorEngine;
use crate::selection::SelectionState;
use crate::skin::{MeshKind, SkinContext};

pub use selection_ops::ScreenView;

/// One editing session over one mesh.
pub struct NormalEditor<K: GeometryKernel, P: HistoryPort> {
    pub(crate) kernel: K,
    /// The edited asset; receives bind-pose normals after every update
    pub(crate) mesh: MeshHandle,
    pub(crate) kind: MeshKind,
    pub(crate) live: LiveModel,
    pub(crate) mirror: MirrorEngine,
    pub(crate) history: HistoryManager<P>,
    pub(crate) settings: EditorSettings,
    pub(crate) display: Box<dyn DisplaySink>,
    pub(crate) writer: Box<dyn AssetWriter>,
}

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    /// Start editing `mesh`, placed at `transform`.
    ///
    /// `bones` are the current bone matrices and are ignored for meshes
    /// without a skin binding. Missing normals or tangents are generated and
    /// written to the asset.
    pub fn new(
        kernel: K,
        port: P,
        mesh: MeshHandle,
        transform: Mat4,
        bones: &[Mat4],
        settings: EditorSettings,
    ) -> Result<Self, EditError> {
        let (live, kind, missing_normals, missing_tangents) = {
            let asset = mesh.borrow();
            if !is_valid_mesh(&asset) {
                return Err(EditError::InvalidMesh {
                    name: asset.name.clone(),
                });
            }
            let count = asset.vertex_count();

            let missing_normals = asset.normals.len() != count;
            let missing_tangents = asset.tangents.len() != count;
            let mut normals = asset.normals.clone();
            normals.resize(count, Vec3::ZERO);
            let mut tangents = asset.tangents.clone();
            tangents.resize(count, Vec4::ZERO);
            let streams = VertexStreams::new(asset.points.clone(), normals, tangents);

            let kind = match &asset.skin {
                Some(binding) if binding.weights.len() == count => {
                    MeshKind::Skinned(SkinContext::new(
                        binding.weights.clone(),
                        binding.bindposes.clone(),
                        bones,
                        transform,
                    ))
                }
                Some(_) => {
                    warn!(
                        "Mesh {} skin weights do not match its vertex count, editing it as static",
                        asset.name
                    );
                    MeshKind::Static
                }
                None => MeshKind::Static,
            };
            let buffers = if kind.is_skinned() {
                BufferSet::new_skinned(streams)
            } else {
                BufferSet::new_static(streams)
            };
            let uv = if asset.uv.len() == count {
                asset.uv.clone()
            } else {
                Vec::new()
            };

            let live = LiveModel {
                indices: asset.indices.clone(),
                uv,
                buffers,
                selection: SelectionState::new(count),
                transform,
            };
            (live, kind, missing_normals, missing_tangents)
        };

        let mut editor = Self {
            kernel,
            mesh,
            kind,
            live,
            mirror: MirrorEngine::new(),
            history: HistoryManager::new(port),
            settings,
            display: Box::new(NullDisplay),
            writer: Box::new(FsWriter),
        };

        if missing_normals {
            editor.kernel.generate_normals(&mut editor.live.bind_view());
            let bind = editor.live.buffers.bind_mut();
            bind.normals_base.clone_from(&bind.normals);
            editor.mesh.borrow_mut().normals.clone_from(&bind.normals);
        }
        if missing_tangents {
            editor.kernel.generate_tangents(&mut editor.live.bind_view());
            let bind = editor.live.buffers.bind_mut();
            bind.tangents_base.clone_from(&bind.tangents);
            editor.mesh.borrow_mut().tangents.clone_from(&bind.tangents);
        }
        editor.pose_from_bind();

        info!(
            "Editing mesh {} ({} vertices, {})",
            editor.mesh.borrow().name,
            editor.live.vertex_count(),
            if editor.kind.is_skinned() { "skinned" } else { "static" }
        );
        Ok(editor)
    }

    /// Replace the display sink and upload the current buffers to it.
    pub fn with_display(mut self, display: Box<dyn DisplaySink>) -> Self {
        self.display = display;
        self.upload_all();
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn AssetWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn is_skinned(&self) -> bool {
        self.kind.is_skinned()
    }

    pub fn skin(&self) -> Option<&SkinContext> {
        self.kind.skin()
    }

    pub fn live(&self) -> &LiveModel {
        &self.live
    }

    pub fn vertex_count(&self) -> usize {
        self.live.vertex_count()
    }

    /// Posed normals
    pub fn normals(&self) -> &[Vec3] {
        &self.live.buffers.posed.normals
    }

    /// Posed normals as they were when editing began
    pub fn base_normals(&self) -> &[Vec3] {
        &self.live.buffers.posed.normals_base
    }

    /// Bind-pose normals; the posed ones for static meshes
    pub fn bind_normals(&self) -> &[Vec3] {
        &self.live.buffers.bind().normals
    }

    pub fn points(&self) -> &[Vec3] {
        &self.live.buffers.posed.points
    }

    pub fn tangents(&self) -> &[Vec4] {
        &self.live.buffers.posed.tangents
    }

    pub fn selection(&self) -> &SelectionState {
        &self.live.selection
    }

    pub fn mirror(&self) -> &MirrorEngine {
        &self.mirror
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        &mut self.settings
    }

    pub fn history(&self) -> &HistoryManager<P> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryManager<P> {
        &mut self.history
    }

    /// Push every posed buffer and the selection to the display.
    pub fn upload_all(&mut self) {
        let posed = &self.live.buffers.posed;
        self.display.upload_points(&posed.points);
        self.display.upload_normals(&posed.normals);
        self.display.upload_tangents(&posed.tangents);
        self.display.upload_base(&posed.normals_base, &posed.tangents_base);
        self.display.upload_selection(&self.live.selection.weights);
    }

    /// Re-derive every posed stream from bind pose. No-op for static meshes.
    pub(crate) fn pose_from_bind(&mut self) {
        if let (MeshKind::Skinned(skin), Some((bind, posed))) =
            (&mut self.kind, self.live.buffers.split_mut())
        {
            skin.pose_all(&self.kernel, bind, posed);
        }
    }

    /// Follow the object transform and, for skinned meshes, the bones.
    ///
    /// Returns whether the posed buffers were re-skinned.
    pub fn update_transform(&mut self, transform: Mat4, bones: &[Mat4]) -> bool {
        self.live.transform = transform;
        let MeshKind::Skinned(skin) = &mut self.kind else {
            return false;
        };
        if !skin.observe(transform, bones) {
            return false;
        }
        debug!("Skeleton moved, re-posing buffers");
        self.pose_from_bind();
        self.upload_all();
        true
    }

    /// Carry edited posed normals back to the mesh.
    ///
    /// Skinned meshes are reverse-skinned into bind pose first. With `mirror`
    /// set the mirror relation is enforced (re-posing the result when
    /// skinned). Bind-pose normals are then written to the asset, tangents
    /// follow in realtime mode, and the result is uploaded.
    ///
    /// Returns whether mirroring was applied. [`EditError::AsymmetricMesh`]
    /// still leaves the update complete, only unmirrored.
    pub fn sync_normals(&mut self, mirror: bool) -> Result<bool, EditError> {
        let epsilon = self.settings.mirror_epsilon;
        let mirrored = match &self.kind {
            MeshKind::Skinned(skin) => match self.live.buffers.split_mut() {
                Some((bind, posed)) => {
                    skin.unpose_normals(&self.kernel, &posed.normals, &mut bind.normals);
                    let result = if mirror {
                        self.mirror.enforce(
                            &self.kernel,
                            &mut self.settings.mirror_mode,
                            epsilon,
                            &bind.points,
                            &bind.normals_base,
                            &mut bind.normals,
                        )
                    } else {
                        Ok(false)
                    };
                    if matches!(result, Ok(true)) {
                        skin.pose_normals(&self.kernel, &bind.normals, &mut posed.normals);
                    }
                    result
                }
                None => Ok(false),
            },
            MeshKind::Static => {
                let posed = &mut self.live.buffers.posed;
                if mirror {
                    self.mirror.enforce(
                        &self.kernel,
                        &mut self.settings.mirror_mode,
                        epsilon,
                        &posed.points,
                        &posed.normals_base,
                        &mut posed.normals,
                    )
                } else {
                    Ok(false)
                }
            }
        };

        self.mesh
            .borrow_mut()
            .normals
            .clone_from(&self.live.buffers.bind().normals);
        if self.settings.tangents_mode == TangentsUpdateMode::Realtime {
            self.recalculate_tangents();
        }
        self.mesh.borrow_mut().upload();
        self.display.upload_normals(&self.live.buffers.posed.normals);
        mirrored
    }

    /// [`Self::sync_normals`], for callers that do not care whether
    /// mirroring happened. An asymmetric mesh was already reported.
    pub fn update_normals(&mut self, mirror: bool) {
        if let Err(err) = self.sync_normals(mirror) {
            debug!("Normals updated without mirroring: {}", err);
        }
    }

    /// Recompute the selection summary and pivot from the weights.
    ///
    /// A non-empty selection also moves the settings pivot. Returns the
    /// number of selected vertices.
    pub fn update_selection(&mut self) -> usize {
        let summary = self.kernel.update_selection(&self.live.view());
        let upload = self.live.selection.apply_summary(summary);
        if summary.count > 0 {
            self.settings.pivot_position = self.live.selection.pivot_position();
            self.settings.pivot_rotation = self.live.selection.pivot_rotation();
        }
        if upload {
            self.display.upload_selection(&self.live.selection.weights);
        }
        summary.count
    }

    /// Shared tail of one-shot edits.
    pub(crate) fn finish_edit(&mut self, push_undo: bool) {
        self.update_normals(true);
        if push_undo {
            self.push_undo();
        }
    }
}
