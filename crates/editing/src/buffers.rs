//! Buffer & transform manager.
//!
//! Owns the live vertex buffers of an editing session and hands the kernel
//! borrowed views of them. Skinned meshes keep a bind-pose copy next to the
//! posed one; static meshes only have the posed set, which then doubles as
//! bind pose.

use geometry::ModelData;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use normalpaint_config::Coordinate;

use crate::selection::SelectionState;

/// Parallel per-vertex arrays, all of the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexStreams {
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    /// Normals as they were when editing began
    pub normals_base: Vec<Vec3>,
    /// Tangents as they were when editing began
    pub tangents_base: Vec<Vec4>,
}

impl VertexStreams {
    /// Streams whose base copies start out equal to the live ones.
    pub fn new(points: Vec<Vec3>, normals: Vec<Vec3>, tangents: Vec<Vec4>) -> Self {
        Self {
            normals_base: normals.clone(),
            tangents_base: tangents.clone(),
            points,
            normals,
            tangents,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Posed buffers plus, for skinned meshes, their bind-pose source.
#[derive(Debug, Clone, Default)]
pub struct BufferSet {
    /// Display-visible, deformed by the current pose
    pub posed: VertexStreams,
    /// Bind pose, present only for skinned meshes
    pub bind: Option<VertexStreams>,
}

impl BufferSet {
    pub fn new_static(streams: VertexStreams) -> Self {
        Self {
            posed: streams,
            bind: None,
        }
    }

    /// Posed streams start as a copy of bind pose until the first skinning pass.
    pub fn new_skinned(bind: VertexStreams) -> Self {
        Self {
            posed: bind.clone(),
            bind: Some(bind),
        }
    }

    /// Bind-pose streams; the posed set for static meshes.
    pub fn bind(&self) -> &VertexStreams {
        self.bind.as_ref().unwrap_or(&self.posed)
    }

    pub fn bind_mut(&mut self) -> &mut VertexStreams {
        match &mut self.bind {
            Some(bind) => bind,
            None => &mut self.posed,
        }
    }

    /// Bind and posed streams together, only when they are distinct.
    pub fn split_mut(&mut self) -> Option<(&mut VertexStreams, &mut VertexStreams)> {
        let posed = &mut self.posed;
        self.bind.as_mut().map(|bind| (bind, posed))
    }
}

/// Everything a kernel view is built from.
#[derive(Debug, Clone, Default)]
pub struct LiveModel {
    pub indices: Vec<u32>,
    pub uv: Vec<Vec2>,
    pub buffers: BufferSet,
    pub selection: SelectionState,
    /// Local to world of the edited object
    pub transform: Mat4,
}

impl LiveModel {
    pub fn vertex_count(&self) -> usize {
        self.buffers.posed.len()
    }

    /// Posed view with the live transform.
    pub fn view(&mut self) -> ModelData<'_> {
        self.view_with(self.transform)
    }

    /// Posed view with a substituted transform. The live transform is not
    /// touched, so nothing leaks past the call.
    pub fn view_with(&mut self, transform: Mat4) -> ModelData<'_> {
        let posed = &mut self.buffers.posed;
        ModelData {
            indices: &self.indices,
            points: &posed.points,
            normals: &mut posed.normals,
            tangents: &mut posed.tangents,
            uv: &self.uv,
            selection: &mut self.selection.weights,
            transform,
        }
    }

    /// Posed view together with the posed base normals.
    pub fn view_with_base(&mut self) -> (ModelData<'_>, &[Vec3]) {
        let posed = &mut self.buffers.posed;
        let model = ModelData {
            indices: &self.indices,
            points: &posed.points,
            normals: &mut posed.normals,
            tangents: &mut posed.tangents,
            uv: &self.uv,
            selection: &mut self.selection.weights,
            transform: self.transform,
        };
        (model, &posed.normals_base)
    }

    /// Bind-pose view, used for tangent generation.
    pub fn bind_view(&mut self) -> ModelData<'_> {
        let transform = self.transform;
        let bind = self.buffers.bind_mut();
        ModelData {
            indices: &self.indices,
            points: &bind.points,
            normals: &mut bind.normals,
            tangents: &mut bind.tangents,
            uv: &self.uv,
            selection: &mut self.selection.weights,
            transform,
        }
    }

    /// Express a direction given in `frame` in world space.
    pub fn to_world_vector(&self, v: Vec3, frame: Coordinate, pivot_rotation: Quat) -> Vec3 {
        match frame {
            Coordinate::World => v,
            Coordinate::Local => self.transform.transform_vector3(v),
            Coordinate::Pivot => pivot_rotation * v,
        }
    }

    /// Transform and pivot handed to rotate/scale tools for a frame.
    ///
    /// World and local frames ignore the pivot orientation; the local frame
    /// also runs the kernel without the model transform, with the pivot
    /// moved into local space.
    pub fn frame_override(
        &self,
        frame: Coordinate,
        pivot_position: Vec3,
        pivot_rotation: Quat,
    ) -> (Mat4, Vec3, Quat) {
        match frame {
            Coordinate::World => (self.transform, pivot_position, Quat::IDENTITY),
            Coordinate::Local => (
                Mat4::IDENTITY,
                self.transform.inverse().transform_point3(pivot_position),
                Quat::IDENTITY,
            ),
            Coordinate::Pivot => (self.transform, pivot_position, pivot_rotation),
        }
    }
}
