//! Normal and tangent synthesis from topology.

use glam::{Vec2, Vec3, Vec4};

use crate::raycast::triangle_indices;

/// Area-weighted vertex normals. Vertices not referenced by any triangle
/// keep their current normal.
pub fn vertex_normals(indices: &[u32], points: &[Vec3], normals: &mut [Vec3]) {
    let mut accum = vec![Vec3::ZERO; points.len()];
    for tri in 0..indices.len() / 3 {
        let [a, b, c] = triangle_indices(indices, tri);
        let (Some(&pa), Some(&pb), Some(&pc)) = (points.get(a), points.get(b), points.get(c))
        else {
            continue;
        };
        // Unnormalized cross product is twice the area
        let face = (pb - pa).cross(pc - pa);
        for v in [a, b, c] {
            accum[v] += face;
        }
    }
    for (n, sum) in normals.iter_mut().zip(accum) {
        let sum = sum.normalize_or_zero();
        if sum != Vec3::ZERO {
            *n = sum;
        }
    }
}

/// Per-vertex tangents from UV gradients, Gram-Schmidt orthogonalized
/// against the normal.
///
/// When `handedness` is false every w is 1; otherwise w carries the sign of
/// the UV basis. Without usable UVs an arbitrary perpendicular is used.
pub fn uv_tangents(
    indices: &[u32],
    points: &[Vec3],
    normals: &[Vec3],
    uv: &[Vec2],
    tangents: &mut [Vec4],
    handedness: bool,
) {
    let count = tangents.len().min(normals.len());
    let usable = count.min(points.len());
    let mut tan = vec![Vec3::ZERO; count];
    let mut bitan = vec![Vec3::ZERO; count];

    if uv.len() >= count {
        for tri in 0..indices.len() / 3 {
            let [a, b, c] = triangle_indices(indices, tri);
            if a >= usable || b >= usable || c >= usable {
                continue;
            }
            let e1 = points[b] - points[a];
            let e2 = points[c] - points[a];
            let d1 = uv[b] - uv[a];
            let d2 = uv[c] - uv[a];
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < 1e-12 {
                continue;
            }
            let r = 1.0 / det;
            let t = (e1 * d2.y - e2 * d1.y) * r;
            let bt = (e2 * d1.x - e1 * d2.x) * r;
            for v in [a, b, c] {
                tan[v] += t;
                bitan[v] += bt;
            }
        }
    }

    for i in 0..count {
        let n = normals[i];
        let t = (tan[i] - n * n.dot(tan[i])).normalize_or_zero();
        let t = if t == Vec3::ZERO { n.any_orthonormal_vector() } else { t };
        let w = if handedness && n.cross(t).dot(bitan[i]) < 0.0 {
            -1.0
        } else {
            1.0
        };
        tangents[i] = t.extend(w);
    }
}
