//! Selection and picking
//!
//! Every operation that changes the weights refreshes the selection summary
//! and pivot before returning.

use geometry::{GeometryKernel, RayHit, ScreenQuery};
use glam::{Mat4, Vec2, Vec3};

use crate::history::HistoryPort;

use super::NormalEditor;
use super::brush_ops::brush_dab;

/// Half extent, in pixels, of the box a click selects in.
const CLICK_HALF_EXTENT: f32 = 15.0;

/// Camera used for screen-space selection and picking.
#[derive(Debug, Clone, Copy)]
pub struct ScreenView {
    /// World to clip space
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    /// Viewport size in pixels
    pub viewport: Vec2,
}

impl ScreenView {
    pub fn new(view_proj: Mat4, camera_position: Vec3, viewport: Vec2) -> Self {
        Self {
            view_proj,
            camera_position,
            viewport,
        }
    }

    /// Pixel coordinates (origin top-left, y down) to NDC (y up).
    pub fn to_ndc(&self, pixel: Vec2) -> Vec2 {
        let unit = pixel / self.viewport * 2.0 - 1.0;
        Vec2::new(unit.x, -unit.y)
    }

    pub fn query(&self, front_face_only: bool) -> ScreenQuery {
        ScreenQuery {
            view_proj: self.view_proj,
            camera_position: self.camera_position,
            front_face_only,
        }
    }

    /// World-space ray through a pixel, as (origin, direction).
    pub fn ray(&self, pixel: Vec2) -> (Vec3, Vec3) {
        let ndc = self.to_ndc(pixel);
        let inverse = self.view_proj.inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        (near, (far - near).normalize_or_zero())
    }

    /// NDC rectangle spanned by two pixel corners, as (min, max).
    fn ndc_rect(&self, a: Vec2, b: Vec2) -> (Vec2, Vec2) {
        let (a, b) = (self.to_ndc(a), self.to_ndc(b));
        (a.min(b), a.max(b))
    }
}

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    fn selection_changed(&mut self, touched: bool) -> bool {
        if touched {
            self.update_selection();
        }
        touched
    }

    /// Select the vertex nearest the viewer around a clicked pixel.
    pub fn select_vertex(&mut self, view: &ScreenView, pixel: Vec2, strength: f32) -> bool {
        let half = Vec2::splat(CLICK_HALF_EXTENT);
        let (min, max) = view.ndc_rect(pixel - half, pixel + half);
        let query = view.query(self.settings.select_front_face_only);
        let touched = self
            .kernel
            .select_single(&mut self.live.view(), &query, min, max, strength);
        self.selection_changed(touched > 0)
    }

    /// Select every vertex inside a pixel rectangle.
    pub fn select_rect(
        &mut self,
        view: &ScreenView,
        start: Vec2,
        end: Vec2,
        strength: f32,
    ) -> bool {
        let (min, max) = view.ndc_rect(start, end);
        let query = view.query(self.settings.select_front_face_only);
        let touched = self
            .kernel
            .select_rect(&mut self.live.view(), &query, min, max, strength);
        self.selection_changed(touched > 0)
    }

    /// Select every vertex inside a pixel polygon.
    pub fn select_lasso(&mut self, view: &ScreenView, lasso: &[Vec2], strength: f32) -> bool {
        let lasso: Vec<Vec2> = lasso.iter().map(|p| view.to_ndc(*p)).collect();
        let query = view.query(self.settings.select_front_face_only);
        let touched = self
            .kernel
            .select_lasso(&mut self.live.view(), &query, &lasso, strength);
        self.selection_changed(touched > 0)
    }

    /// Soft selection with the configured brush shape.
    pub fn select_brush(&mut self, position: Vec3, strength: f32) -> bool {
        let samples = self.settings.brush.samples();
        let mut dab = brush_dab(&self.settings.brush, position, &samples);
        dab.strength = strength;
        let touched = self.kernel.select_brush(&mut self.live.view(), &dab);
        self.selection_changed(touched > 0)
    }

    /// Select the corners of the first triangle a world-space ray hits.
    pub fn select_triangle(&mut self, origin: Vec3, direction: Vec3, strength: f32) -> bool {
        let touched = self
            .kernel
            .select_triangle(&mut self.live.view(), origin, direction, strength);
        self.selection_changed(touched > 0)
    }

    /// Boundary vertices, limited to the selected region when there is one.
    pub fn select_edge(&mut self, strength: f32, clear: bool) -> bool {
        let mask = self.live.selection.has_selection();
        let touched = self
            .kernel
            .select_edge(&mut self.live.view(), strength, clear, mask);
        self.selection_changed(touched > 0)
    }

    /// Boundary loops, limited to loops touching the selection when there is one.
    pub fn select_hole(&mut self, strength: f32, clear: bool) -> bool {
        let mask = self.live.selection.has_selection();
        let touched = self
            .kernel
            .select_hole(&mut self.live.view(), strength, clear, mask);
        self.selection_changed(touched > 0)
    }

    /// Grow the selection over connected triangles; selects everything when
    /// nothing is selected yet.
    pub fn select_connected(&mut self, strength: f32, clear: bool) -> bool {
        if !self.live.selection.has_selection() {
            return self.select_all();
        }
        let touched = self
            .kernel
            .select_connected(&mut self.live.view(), strength, clear);
        self.selection_changed(touched > 0)
    }

    pub fn select_all(&mut self) -> bool {
        let touched = self.live.selection.select_all();
        self.selection_changed(touched)
    }

    pub fn invert_selection(&mut self) -> bool {
        let touched = self.live.selection.invert();
        self.selection_changed(touched)
    }

    /// Returns false only for a mesh without vertices.
    pub fn clear_selection(&mut self) -> bool {
        let touched = self.live.selection.clear();
        self.selection_changed(touched)
    }

    pub fn raycast(&mut self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        self.kernel.raycast(&self.live.view(), origin, direction)
    }

    /// World-space hit position and triangle under a pixel.
    pub fn pick(&mut self, view: &ScreenView, pixel: Vec2) -> Option<(Vec3, usize)> {
        let (origin, direction) = view.ray(pixel);
        let hit = self.raycast(origin, direction)?;
        Some((origin + direction * hit.distance, hit.triangle))
    }

    /// World-space normal interpolated at a point on `triangle`.
    pub fn pick_normal(&mut self, position: Vec3, triangle: usize) -> Vec3 {
        let model = self.live.view();
        self.kernel
            .pick_normal(&model, &*model.normals, position, triangle)
    }

    /// [`Self::pick_normal`] over the base normals.
    pub fn pick_base_normal(&mut self, position: Vec3, triangle: usize) -> Vec3 {
        let (model, base) = self.live.view_with_base();
        self.kernel.pick_normal(&model, base, position, triangle)
    }
}
