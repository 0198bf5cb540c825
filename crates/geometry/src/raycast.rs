//! Ray-mesh intersection.
//!
//! Moller-Trumbore ray-triangle tests over flat index/point buffers, plus
//! barycentric helpers for interpolating per-vertex attributes at a hit.

use glam::{Mat4, Vec3};

use crate::types::{ModelData, RayHit};

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit distance and barycentric coordinates if the ray intersects
/// the triangle in front of its origin. Both windings are accepted.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Interpolate a Vec3 attribute using barycentric coordinates.
pub fn interpolate_vec3(v0: Vec3, v1: Vec3, v2: Vec3, u: f32, v: f32) -> Vec3 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Barycentric (u, v) of a point projected onto a triangle's plane.
///
/// Degenerate triangles yield (0, 0), i.e. the first vertex.
pub fn barycentric(p: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> (f32, f32) {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let ep = p - v0;
    let d11 = e1.dot(e1);
    let d12 = e1.dot(e2);
    let d22 = e2.dot(e2);
    let dp1 = ep.dot(e1);
    let dp2 = ep.dot(e2);
    let denom = d11 * d22 - d12 * d12;
    if denom.abs() < EPSILON * EPSILON {
        return (0.0, 0.0);
    }
    let u = (d22 * dp1 - d12 * dp2) / denom;
    let v = (d11 * dp2 - d12 * dp1) / denom;
    (u, v)
}

/// Vertex indices of a triangle
pub fn triangle_indices(indices: &[u32], tri_index: usize) -> [usize; 3] {
    let base = tri_index * 3;
    [
        indices[base] as usize,
        indices[base + 1] as usize,
        indices[base + 2] as usize,
    ]
}

/// Closest triangle hit in the buffers' own space.
///
/// Triangles referencing out-of-range vertices are skipped.
pub fn raycast_triangles(
    indices: &[u32],
    points: &[Vec3],
    ray_origin: Vec3,
    ray_dir: Vec3,
) -> Option<(usize, TriangleHit)> {
    let mut closest: Option<(usize, TriangleHit)> = None;

    // Brute force, like the rest of the reference kernel
    for tri_idx in 0..indices.len() / 3 {
        let [i0, i1, i2] = triangle_indices(indices, tri_idx);
        let (Some(&v0), Some(&v1), Some(&v2)) = (points.get(i0), points.get(i1), points.get(i2))
        else {
            continue;
        };

        if let Some(hit) = ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2) {
            let dominated = match &closest {
                Some((_, prev)) => hit.t >= prev.t,
                None => false,
            };
            if !dominated {
                closest = Some((tri_idx, hit));
            }
        }
    }

    closest
}

/// Cast a world-space ray against a transformed mesh.
///
/// Returns the hit triangle, the barycentric hit and the world-space
/// distance from `origin`.
pub fn raycast_transformed(
    indices: &[u32],
    points: &[Vec3],
    transform: Mat4,
    origin: Vec3,
    direction: Vec3,
) -> Option<(usize, TriangleHit, f32)> {
    let inverse = transform.inverse();
    let local_origin = inverse.transform_point3(origin);
    let local_dir = inverse.transform_vector3(direction);
    if local_dir.length_squared() < EPSILON * EPSILON {
        return None;
    }

    let (tri, hit) = raycast_triangles(indices, points, local_origin, local_dir)?;
    let world_hit = transform.transform_point3(local_origin + local_dir * hit.t);
    Some((tri, hit, world_hit.distance(origin)))
}

/// Closest hit of a world-space ray on a model.
pub fn raycast_model(model: &ModelData<'_>, origin: Vec3, direction: Vec3) -> Option<RayHit> {
    raycast_transformed(model.indices, model.points, model.transform, origin, direction).map(
        |(triangle, _, distance)| RayHit { triangle, distance },
    )
}

/// Interpolated world-space normal at a world-space point on a triangle.
pub fn pick_normal(
    model: &ModelData<'_>,
    normals: &[Vec3],
    position: Vec3,
    triangle: usize,
) -> Vec3 {
    if triangle >= model.triangle_count() {
        return Vec3::ZERO;
    }
    let [i0, i1, i2] = triangle_indices(model.indices, triangle);
    let (Some(&p0), Some(&p1), Some(&p2)) = (
        model.points.get(i0),
        model.points.get(i1),
        model.points.get(i2),
    ) else {
        return Vec3::ZERO;
    };
    let (Some(&n0), Some(&n1), Some(&n2)) = (normals.get(i0), normals.get(i1), normals.get(i2))
    else {
        return Vec3::ZERO;
    };

    let local = model.transform.inverse().transform_point3(position);
    let (u, v) = barycentric(local, p0, p1, p2);
    let normal = interpolate_vec3(n0, n1, n2, u, v);
    model.transform.transform_vector3(normal).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Vec<u32>, Vec<Vec3>) {
        (
            vec![0, 1, 2],
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_ray_triangle_hit() {
        let (_, p) = unit_triangle();
        let origin = Vec3::new(0.25, 0.25, 1.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);

        let hit = ray_triangle_intersection(origin, dir, p[0], p[1], p[2]);
        assert!(hit.is_some());

        let hit = hit.unwrap();
        assert!((hit.t - 1.0).abs() < EPSILON);
        assert!((hit.u - 0.25).abs() < EPSILON);
        assert!((hit.v - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_ray_triangle_miss() {
        let (_, p) = unit_triangle();
        let origin = Vec3::new(2.0, 2.0, 1.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);
        assert!(ray_triangle_intersection(origin, dir, p[0], p[1], p[2]).is_none());
    }

    #[test]
    fn test_ray_triangle_behind() {
        let (_, p) = unit_triangle();
        let origin = Vec3::new(0.25, 0.25, 1.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(ray_triangle_intersection(origin, dir, p[0], p[1], p[2]).is_none());
    }

    #[test]
    fn test_barycentric_matches_interpolation() {
        let (_, p) = unit_triangle();
        let (u, v) = barycentric(Vec3::new(0.2, 0.3, 0.0), p[0], p[1], p[2]);
        assert!((u - 0.2).abs() < 1e-5);
        assert!((v - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_transformed_reports_world_distance() {
        let (indices, points) = unit_triangle();
        // Scale by 2 and push the mesh 3 units down z
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0))
            * Mat4::from_scale(Vec3::splat(2.0));

        let hit = raycast_transformed(
            &indices,
            &points,
            transform,
            Vec3::new(0.5, 0.5, 1.0),
            Vec3::NEG_Z,
        );
        let (tri, _, distance) = hit.unwrap();
        assert_eq!(tri, 0);
        assert!((distance - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_raycast_picks_closest_triangle() {
        let indices = vec![0, 1, 2, 3, 4, 5];
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(1.0, 0.0, 0.5),
            Vec3::new(0.0, 1.0, 0.5),
        ];
        let (tri, hit) =
            raycast_triangles(&indices, &points, Vec3::new(0.2, 0.2, 2.0), Vec3::NEG_Z).unwrap();
        assert_eq!(tri, 1);
        assert!((hit.t - 1.5).abs() < 1e-5);
    }
}
