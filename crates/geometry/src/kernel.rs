//! The kernel seam.
//!
//! The editing core never touches geometry directly: every raycast,
//! selection test, brush dab and skinning pass goes through
//! [`GeometryKernel`]. Operations are stateless; each call borrows the
//! buffers it needs for exactly that call.
//!
//! Every method has a reference CPU implementation, so an implementor only
//! overrides what it accelerates (or, in tests, what it scripts).

use glam::{Quat, Vec2, Vec3};

use crate::brush::{self, BlendOp};
use crate::types::{
    BrushDab, ModelData, RayHit, ScreenQuery, SelectionSummary, SkinData, SkinStreams,
    SkinStreamsMut, TargetModel, WeldModel, WeldScope,
};
use crate::{generate, mirror, project, raycast, select, skinning, smooth, transform};

/// Default distance under which two vertices count as coincident when welding.
pub const DEFAULT_WELD_EPSILON: f32 = 1e-4;

pub trait GeometryKernel {
    /// Tolerance used by the weld operations.
    fn weld_epsilon(&self) -> f32 {
        DEFAULT_WELD_EPSILON
    }

    // Picking

    fn raycast(&self, model: &ModelData<'_>, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        raycast::raycast_model(model, origin, direction)
    }

    /// Interpolate `normals` at a world-space point on `triangle`.
    fn pick_normal(
        &self,
        model: &ModelData<'_>,
        normals: &[Vec3],
        position: Vec3,
        triangle: usize,
    ) -> Vec3 {
        raycast::pick_normal(model, normals, position, triangle)
    }

    // Selection

    fn select_single(
        &self,
        model: &mut ModelData<'_>,
        query: &ScreenQuery,
        min: Vec2,
        max: Vec2,
        strength: f32,
    ) -> usize {
        select::select_single(model, query, min, max, strength)
    }

    fn select_rect(
        &self,
        model: &mut ModelData<'_>,
        query: &ScreenQuery,
        min: Vec2,
        max: Vec2,
        strength: f32,
    ) -> usize {
        select::select_rect(model, query, min, max, strength)
    }

    fn select_lasso(
        &self,
        model: &mut ModelData<'_>,
        query: &ScreenQuery,
        lasso: &[Vec2],
        strength: f32,
    ) -> usize {
        select::select_lasso(model, query, lasso, strength)
    }

    fn select_brush(&self, model: &mut ModelData<'_>, dab: &BrushDab<'_>) -> usize {
        select::select_brush(model, dab)
    }

    fn select_triangle(
        &self,
        model: &mut ModelData<'_>,
        origin: Vec3,
        direction: Vec3,
        strength: f32,
    ) -> usize {
        select::select_triangle(model, origin, direction, strength)
    }

    fn select_edge(
        &self,
        model: &mut ModelData<'_>,
        strength: f32,
        clear: bool,
        mask: bool,
    ) -> usize {
        select::select_edge(model, strength, clear, mask)
    }

    fn select_hole(
        &self,
        model: &mut ModelData<'_>,
        strength: f32,
        clear: bool,
        mask: bool,
    ) -> usize {
        select::select_hole(model, strength, clear, mask)
    }

    fn select_connected(&self, model: &mut ModelData<'_>, strength: f32, clear: bool) -> usize {
        select::select_connected(model, strength, clear)
    }

    fn update_selection(&self, model: &ModelData<'_>) -> SelectionSummary {
        select::update_selection(model)
    }

    // Brushes

    fn brush_paint(
        &self,
        model: &mut ModelData<'_>,
        dab: &BrushDab<'_>,
        base_normal: Vec3,
        blend: BlendOp,
        mask: bool,
    ) -> usize {
        brush::paint(model, dab, base_normal, blend, mask)
    }

    fn brush_replace(
        &self,
        model: &mut ModelData<'_>,
        dab: &BrushDab<'_>,
        amount: Vec3,
        mask: bool,
    ) -> usize {
        brush::replace(model, dab, amount, mask)
    }

    fn brush_smooth(&self, model: &mut ModelData<'_>, dab: &BrushDab<'_>, mask: bool) -> usize {
        brush::smooth(model, dab, mask)
    }

    fn brush_lerp(
        &self,
        model: &mut ModelData<'_>,
        dab: &BrushDab<'_>,
        base_normals: &[Vec3],
        mask: bool,
    ) -> usize {
        brush::lerp_to_base(model, dab, base_normals, mask)
    }

    // Transforms

    fn assign(&self, model: &mut ModelData<'_>, value: Vec3) -> usize {
        transform::assign(model, value)
    }

    fn translate(&self, model: &mut ModelData<'_>, amount: Vec3) -> usize {
        transform::translate(model, amount)
    }

    fn rotate(&self, model: &mut ModelData<'_>, amount: Quat, pivot_rotation: Quat) -> usize {
        transform::rotate(model, amount, pivot_rotation)
    }

    fn rotate_pivot(
        &self,
        model: &mut ModelData<'_>,
        amount: Quat,
        pivot_position: Vec3,
        pivot_rotation: Quat,
    ) -> usize {
        transform::rotate_pivot(model, amount, pivot_position, pivot_rotation)
    }

    fn scale(
        &self,
        model: &mut ModelData<'_>,
        amount: Vec3,
        pivot_position: Vec3,
        pivot_rotation: Quat,
    ) -> usize {
        transform::scale(model, amount, pivot_position, pivot_rotation)
    }

    // Smoothing and welding

    fn smooth(&self, model: &mut ModelData<'_>, radius: f32, strength: f32, mask: bool) -> usize {
        smooth::smooth(model, radius, strength, mask)
    }

    fn weld(
        &self,
        model: &mut ModelData<'_>,
        smoothing: bool,
        angle_deg: f32,
        mask: bool,
    ) -> usize {
        smooth::weld(model, self.weld_epsilon(), smoothing, angle_deg, mask)
    }

    fn weld_multi(
        &self,
        model: &mut ModelData<'_>,
        targets: &mut [WeldModel<'_>],
        scope: WeldScope,
        angle_deg: f32,
        mask: bool,
    ) -> usize {
        smooth::weld_multi(model, targets, scope, self.weld_epsilon(), angle_deg, mask)
    }

    // Mirroring

    /// Fill `relation` and return how many vertices found a counterpart.
    fn build_mirror_relation(
        &self,
        points: &[Vec3],
        normals: &[Vec3],
        plane_normal: Vec3,
        epsilon: f32,
        relation: &mut [u32],
    ) -> usize {
        mirror::build_mirror_relation(points, normals, plane_normal, epsilon, relation)
    }

    fn apply_mirroring(&self, relation: &[u32], plane_normal: Vec3, normals: &mut [Vec3]) {
        mirror::apply_mirroring(relation, plane_normal, normals)
    }

    // Projection

    fn project_normals(
        &self,
        model: &mut ModelData<'_>,
        target: &TargetModel<'_>,
        ray_dirs: &[Vec3],
        mask: bool,
    ) -> usize {
        project::project_normals(model, target, ray_dirs, mask)
    }

    // Skinning

    fn apply_skinning(&self, skin: &SkinData<'_>, src: SkinStreams<'_>, dst: SkinStreamsMut<'_>) {
        skinning::apply_skinning(skin, src, dst)
    }

    fn apply_reverse_skinning(
        &self,
        skin: &SkinData<'_>,
        src: SkinStreams<'_>,
        dst: SkinStreamsMut<'_>,
    ) {
        skinning::apply_reverse_skinning(skin, src, dst)
    }

    // Synthesis

    fn generate_normals(&self, model: &mut ModelData<'_>) {
        generate::vertex_normals(model.indices, model.points, model.normals)
    }

    /// Fast tangents: every w is 1.
    fn generate_tangents(&self, model: &mut ModelData<'_>) {
        generate::uv_tangents(
            model.indices,
            model.points,
            model.normals,
            model.uv,
            model.tangents,
            false,
        )
    }
}
