//! Selection-weighted transform tools.
//!
//! Inputs are in world space; the model transform maps them into the model.
//! Callers that want to work in local space pass an identity transform.
//! Vertices with a zero selection weight are left untouched.

use glam::{Mat4, Quat, Vec3};

use crate::brush::renormalize;
use crate::types::ModelData;

/// Apply `f` to the world-space normal of every selected vertex and blend the
/// result back in by selection weight.
fn blend_selected(
    model: &mut ModelData<'_>,
    mut f: impl FnMut(Vec3, Vec3) -> Vec3,
) -> usize {
    let transform = model.transform;
    let inverse = transform.inverse();
    let mut touched = 0;
    for i in 0..model.vertex_count() {
        let s = model.selection_weight(i);
        if s <= 0.0 {
            continue;
        }
        let n = model.normals[i];
        let world_point = transform.transform_point3(model.points[i]);
        let world_normal = transform.transform_vector3(n).normalize_or_zero();
        let target = inverse
            .transform_vector3(f(world_point, world_normal))
            .normalize_or_zero();
        model.normals[i] = renormalize(n.lerp(target, s), n);
        touched += 1;
    }
    touched
}

/// Point every selected normal at `value`.
pub fn assign(model: &mut ModelData<'_>, value: Vec3) -> usize {
    let value = value.normalize_or_zero();
    blend_selected(model, |_, _| value)
}

/// Offset every selected normal by `amount`.
pub fn translate(model: &mut ModelData<'_>, amount: Vec3) -> usize {
    blend_selected(model, |_, n| n + amount)
}

fn pivot_space(amount: Quat, pivot_rotation: Quat) -> Quat {
    pivot_rotation * amount * pivot_rotation.inverse()
}

/// Rotate selected normals by `amount`, expressed in the pivot's frame.
pub fn rotate(model: &mut ModelData<'_>, amount: Quat, pivot_rotation: Quat) -> usize {
    let rotation = pivot_space(amount, pivot_rotation);
    blend_selected(model, |_, n| rotation * n)
}

/// Tilt selected normals along the path their vertex would take if it were
/// rotated about the pivot.
pub fn rotate_pivot(
    model: &mut ModelData<'_>,
    amount: Quat,
    pivot_position: Vec3,
    pivot_rotation: Quat,
) -> usize {
    let rotation = pivot_space(amount, pivot_rotation);
    blend_selected(model, |p, n| {
        let offset = p - pivot_position;
        n + (rotation * offset - offset)
    })
}

/// Tilt selected normals along the displacement a non-uniform scale about
/// the pivot would give their vertex.
pub fn scale(
    model: &mut ModelData<'_>,
    amount: Vec3,
    pivot_position: Vec3,
    pivot_rotation: Quat,
) -> usize {
    let to_pivot = Mat4::from_quat(pivot_rotation.inverse());
    let from_pivot = Mat4::from_quat(pivot_rotation);
    blend_selected(model, |p, n| {
        let local = to_pivot.transform_vector3(p - pivot_position);
        n + from_pivot.transform_vector3(local * amount - local)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    struct Buffers {
        points: Vec<Vec3>,
        normals: Vec<Vec3>,
        tangents: Vec<Vec4>,
        selection: Vec<f32>,
    }

    impl Buffers {
        fn new(selection: Vec<f32>) -> Self {
            let count = selection.len();
            Self {
                points: (0..count).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
                normals: vec![Vec3::Z; count],
                tangents: Vec::new(),
                selection,
            }
        }

        fn model(&mut self, transform: Mat4) -> ModelData<'_> {
            ModelData {
                indices: &[],
                points: &self.points,
                normals: &mut self.normals,
                tangents: &mut self.tangents,
                uv: &[],
                selection: &mut self.selection,
                transform,
            }
        }
    }

    #[test]
    fn test_assign_only_selected() {
        let mut b = Buffers::new(vec![1.0, 0.0]);
        let touched = assign(&mut b.model(Mat4::IDENTITY), Vec3::X);
        assert_eq!(touched, 1);
        assert!(b.normals[0].distance(Vec3::X) < 1e-6);
        assert_eq!(b.normals[1], Vec3::Z);
    }

    #[test]
    fn test_assign_world_direction_into_rotated_model() {
        let mut b = Buffers::new(vec![1.0]);
        let transform = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assign(&mut b.model(transform), Vec3::Y);
        // World +Y is local +X after a quarter turn about Z
        assert!(b.normals[0].distance(Vec3::X) < 1e-5);
    }

    #[test]
    fn test_partial_weight_blends() {
        let mut b = Buffers::new(vec![0.5]);
        assign(&mut b.model(Mat4::IDENTITY), Vec3::X);
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!(b.normals[0].distance(expected) < 1e-5);
    }

    #[test]
    fn test_translate() {
        let mut b = Buffers::new(vec![1.0]);
        translate(&mut b.model(Mat4::IDENTITY), Vec3::new(0.0, 1.0, 0.0));
        assert!(b.normals[0].distance(Vec3::new(0.0, 1.0, 1.0).normalize()) < 1e-5);
    }

    #[test]
    fn test_rotate_in_pivot_frame() {
        let mut b = Buffers::new(vec![1.0]);
        let quarter = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        rotate(&mut b.model(Mat4::IDENTITY), quarter, Quat::IDENTITY);
        assert!(b.normals[0].distance(Vec3::Y) < 1e-5);

        // Same local rotation expressed in a pivot frame turned about Z
        let mut b = Buffers::new(vec![1.0]);
        let pivot = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        rotate(&mut b.model(Mat4::IDENTITY), quarter, pivot);
        assert!(b.normals[0].distance(Vec3::NEG_X) < 1e-5);
    }

    #[test]
    fn test_unit_scale_leaves_normals() {
        let mut b = Buffers::new(vec![1.0, 1.0]);
        scale(&mut b.model(Mat4::IDENTITY), Vec3::ONE, Vec3::ZERO, Quat::IDENTITY);
        assert!(b.normals.iter().all(|n| n.distance(Vec3::Z) < 1e-6));
    }

    #[test]
    fn test_scale_tilts_away_from_pivot() {
        let mut b = Buffers::new(vec![0.0, 1.0]);
        scale(
            &mut b.model(Mat4::IDENTITY),
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::ZERO,
            Quat::IDENTITY,
        );
        // Vertex at x = 1 gets pushed along +X
        assert!(b.normals[1].x > 0.0);
        assert_eq!(b.normals[0], Vec3::Z);
    }
}
