//! Brush strokes
//!
//! Each call applies one dab at a world-space position using the brush from
//! the editor settings. Dabs update normals but never push history; callers
//! push once when the stroke ends.

use geometry::{BlendOp, BrushDab, GeometryKernel};
use glam::Vec3;
use normalpaint_config::{BrushSettings, PaintBlend};

use crate::history::HistoryPort;

use super::NormalEditor;

fn blend_op(blend: PaintBlend) -> BlendOp {
    match blend {
        PaintBlend::Lerp => BlendOp::Lerp,
        PaintBlend::Add => BlendOp::Add,
        PaintBlend::Subtract => BlendOp::Subtract,
    }
}

pub(crate) fn brush_dab<'a>(
    brush: &BrushSettings,
    position: Vec3,
    samples: &'a [f32],
) -> BrushDab<'a> {
    BrushDab {
        position,
        radius: brush.radius,
        strength: brush.strength,
        samples,
    }
}

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    fn finish_dab(&mut self, touched: usize) -> bool {
        if touched == 0 {
            return false;
        }
        self.update_normals(true);
        true
    }

    /// Paint toward `base_direction` (world space) with the configured blend.
    pub fn paint(&mut self, position: Vec3, base_direction: Vec3) -> bool {
        let brush = &self.settings.brush;
        let samples = brush.samples();
        let dab = brush_dab(brush, position, &samples);
        let touched = self.kernel.brush_paint(
            &mut self.live.view(),
            &dab,
            base_direction,
            blend_op(brush.blend),
            brush.use_selection,
        );
        self.finish_dab(touched)
    }

    /// Blend toward a fixed world-space direction.
    pub fn replace(&mut self, position: Vec3, direction: Vec3) -> bool {
        let direction = self
            .live
            .transform
            .inverse()
            .transform_vector3(direction)
            .normalize_or_zero();
        let brush = &self.settings.brush;
        let samples = brush.samples();
        let dab = brush_dab(brush, position, &samples);
        let touched =
            self.kernel
                .brush_replace(&mut self.live.view(), &dab, direction, brush.use_selection);
        self.finish_dab(touched)
    }

    pub fn smooth(&mut self, position: Vec3) -> bool {
        let brush = &self.settings.brush;
        let samples = brush.samples();
        let dab = brush_dab(brush, position, &samples);
        let touched = self
            .kernel
            .brush_smooth(&mut self.live.view(), &dab, brush.use_selection);
        self.finish_dab(touched)
    }

    /// Blend back toward the base normals.
    pub fn reset(&mut self, position: Vec3) -> bool {
        let brush = &self.settings.brush;
        let samples = brush.samples();
        let dab = brush_dab(brush, position, &samples);
        let (mut model, base) = self.live.view_with_base();
        let touched = self
            .kernel
            .brush_lerp(&mut model, &dab, base, brush.use_selection);
        self.finish_dab(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::quad_editor;
    use super::*;
    use normalpaint_config::FalloffCurve;

    fn constant_brush(editor: &mut NormalEditor<geometry::CpuKernel, crate::history::LinearUndo>) {
        let brush = &mut editor.settings_mut().brush;
        brush.radius = 0.1;
        brush.strength = 1.0;
        brush.falloff = FalloffCurve::Constant;
    }

    #[test]
    fn test_paint_only_reaches_vertices_in_radius() {
        let mut editor = quad_editor();
        constant_brush(&mut editor);
        let corner = Vec3::new(0.5, 0.5, 0.0);

        assert!(editor.paint(corner, Vec3::X));
        assert!(editor.normals()[3].distance(Vec3::X) < 1e-5);
        assert_eq!(editor.normals()[0], Vec3::Z);
        // Nothing under the brush
        assert!(!editor.paint(Vec3::new(5.0, 5.0, 0.0), Vec3::X));
        assert!(editor.history().is_empty());
    }

    #[test]
    fn test_replace_converts_direction_to_local() {
        let mut editor = quad_editor();
        constant_brush(&mut editor);
        editor.update_transform(glam::Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2), &[]);
        // Vertex 1 (0.5, -0.5) lands at (0.5, 0.5) in world space
        assert!(editor.replace(Vec3::new(0.5, 0.5, 0.0), Vec3::Y));
        assert!(editor.normals()[1].distance(Vec3::X) < 1e-5);
    }

    #[test]
    fn test_reset_brush_restores_base() {
        let mut editor = quad_editor();
        constant_brush(&mut editor);
        editor.live.buffers.posed.normals.fill(Vec3::X);

        assert!(editor.reset(Vec3::new(-0.5, -0.5, 0.0)));
        assert!(editor.normals()[0].distance(Vec3::Z) < 1e-5);
        assert_eq!(editor.normals()[1], Vec3::X);
    }

    #[test]
    fn test_masked_brush_skips_unselected() {
        let mut editor = quad_editor();
        constant_brush(&mut editor);
        editor.settings_mut().brush.use_selection = true;
        editor.settings_mut().brush.radius = 2.0;
        editor.live.selection.weights[2] = 1.0;

        assert!(editor.paint(Vec3::ZERO, Vec3::Y));
        assert!(editor.normals()[2].distance(Vec3::Y) < 1e-5);
        assert_eq!(editor.normals()[1], Vec3::Z);
    }
}
