//! Normal projection from another mesh.

use glam::Vec3;

use crate::brush::renormalize;
use crate::raycast::{interpolate_vec3, raycast_transformed, triangle_indices};
use crate::types::{ModelData, TargetModel};

/// Cast a ray from every vertex along its direction in `ray_dirs` (local
/// space), in both senses, and take the interpolated target normal at the
/// nearest hit. Returns the number of vertices that received a normal.
pub fn project_normals(
    model: &mut ModelData<'_>,
    target: &TargetModel<'_>,
    ray_dirs: &[Vec3],
    mask: bool,
) -> usize {
    let inverse = model.transform.inverse();
    let mut projected = 0;

    for i in 0..model.vertex_count() {
        let w = model.mask_weight(i, mask).clamp(0.0, 1.0);
        if w <= 0.0 {
            continue;
        }
        let Some(&dir) = ray_dirs.get(i) else {
            continue;
        };
        let origin = model.world_point(i);
        let dir = model.transform.transform_vector3(dir);

        let nearest = [dir, -dir]
            .into_iter()
            .filter_map(|d| {
                raycast_transformed(target.indices, target.points, target.transform, origin, d)
            })
            .min_by(|a, b| a.2.total_cmp(&b.2));
        let Some((tri, hit, _)) = nearest else {
            continue;
        };

        let [i0, i1, i2] = triangle_indices(target.indices, tri);
        let (Some(&n0), Some(&n1), Some(&n2)) = (
            target.normals.get(i0),
            target.normals.get(i1),
            target.normals.get(i2),
        ) else {
            continue;
        };
        let world = target
            .transform
            .transform_vector3(interpolate_vec3(n0, n1, n2, hit.u, hit.v));
        let local = inverse.transform_vector3(world).normalize_or_zero();
        if local == Vec3::ZERO {
            continue;
        }

        let n = model.normals[i];
        model.normals[i] = renormalize(n.lerp(local, w), n);
        projected += 1;
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec4};

    #[test]
    fn test_projects_from_both_sides() {
        // Target plane at z = 1 with a tilted normal
        let target_indices = [0, 1, 2, 0, 2, 3];
        let target_points = [
            Vec3::new(-5.0, -5.0, 1.0),
            Vec3::new(5.0, -5.0, 1.0),
            Vec3::new(5.0, 5.0, 1.0),
            Vec3::new(-5.0, 5.0, 1.0),
        ];
        let tilted = Vec3::new(0.0, 1.0, 1.0).normalize();
        let target_normals = [tilted; 4];
        let target = TargetModel {
            indices: &target_indices,
            points: &target_points,
            normals: &target_normals,
            transform: Mat4::IDENTITY,
        };

        let points = [Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), Vec3::new(20.0, 0.0, 0.0)];
        let mut normals = [Vec3::Z; 3];
        let mut tangents: [Vec4; 0] = [];
        let mut selection: [f32; 0] = [];
        let mut model = ModelData {
            indices: &[],
            points: &points,
            normals: &mut normals,
            tangents: &mut tangents,
            uv: &[],
            selection: &mut selection,
            transform: Mat4::IDENTITY,
        };
        // Rays along +Z: vertex 1 sits above the target and hits it backwards
        let dirs = [Vec3::Z; 3];
        let projected = project_normals(&mut model, &target, &dirs, false);

        assert_eq!(projected, 2);
        assert!(normals[0].distance(tilted) < 1e-5);
        assert!(normals[1].distance(tilted) < 1e-5);
        assert_eq!(normals[2], Vec3::Z);
    }
}
