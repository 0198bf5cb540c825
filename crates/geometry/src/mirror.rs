//! Mirror relation discovery and application.
//!
//! A relation maps every vertex to the vertex it copies its normal from.
//! Vertices without a counterpart (or lying on the plane) map to themselves.

use glam::Vec3;

use crate::grid::PointGrid;

/// Reflect a vector across the plane through the origin with normal `plane_normal`.
pub fn plane_mirror(v: Vec3, plane_normal: Vec3) -> Vec3 {
    v - plane_normal * (2.0 * v.dot(plane_normal))
}

/// Match every vertex with the vertex at its reflected position.
///
/// Among several positional matches the one whose normal best agrees with the
/// reflected normal wins, so hard-edge seams pair up correctly. Returns the
/// number of vertices matched with a vertex other than themselves.
pub fn build_mirror_relation(
    points: &[Vec3],
    normals: &[Vec3],
    plane_normal: Vec3,
    epsilon: f32,
    relation: &mut [u32],
) -> usize {
    let plane_normal = plane_normal.normalize_or_zero();
    let grid = PointGrid::new(points, epsilon);
    let mut matched = 0;

    for (i, slot) in relation.iter_mut().enumerate() {
        *slot = i as u32;
        let Some(&p) = points.get(i) else {
            continue;
        };
        let target = plane_mirror(p, plane_normal);
        let mirrored_normal = normals
            .get(i)
            .map(|n| plane_mirror(*n, plane_normal))
            .unwrap_or(Vec3::ZERO);

        let mut best: Option<(usize, f32)> = None;
        grid.for_each_near(target, epsilon, |j| {
            let agreement = normals
                .get(j)
                .map(|n| n.dot(mirrored_normal))
                .unwrap_or(0.0);
            if best.is_none_or(|(_, score)| agreement > score) {
                best = Some((j, agreement));
            }
        });

        if let Some((j, _)) = best
            && j != i
        {
            *slot = j as u32;
            matched += 1;
        }
    }

    matched
}

/// Copy reflected source normals into every mapped vertex.
///
/// Sources are read from a snapshot, so chains in the relation never read a
/// value written by the same pass.
pub fn apply_mirroring(relation: &[u32], plane_normal: Vec3, normals: &mut [Vec3]) {
    let plane_normal = plane_normal.normalize_or_zero();
    let source = normals.to_vec();
    for (i, (n, &j)) in normals.iter_mut().zip(relation).enumerate() {
        let j = j as usize;
        if j == i {
            continue;
        }
        if let Some(src) = source.get(j) {
            *n = plane_mirror(*src, plane_normal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_mirror() {
        let v = Vec3::new(0.6, 0.8, 0.0);
        assert_eq!(plane_mirror(v, Vec3::X), Vec3::new(-0.6, 0.8, 0.0));
        assert_eq!(plane_mirror(v, Vec3::Z), v);
    }

    #[test]
    fn test_build_relation_pairs_reflected_vertices() {
        let points = vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let normals = vec![Vec3::NEG_X, Vec3::X, Vec3::Y];
        let mut relation = vec![0; 3];
        let matched = build_mirror_relation(&points, &normals, Vec3::X, 1e-4, &mut relation);
        assert_eq!(matched, 2);
        // On-plane vertex maps to itself
        assert_eq!(relation, vec![1, 0, 2]);
    }

    #[test]
    fn test_build_relation_asymmetric_mesh() {
        let points = vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.5, 0.0, 0.0)];
        let normals = vec![Vec3::Y; 2];
        let mut relation = vec![0; 2];
        assert_eq!(
            build_mirror_relation(&points, &normals, Vec3::X, 1e-4, &mut relation),
            0
        );
    }

    #[test]
    fn test_seam_prefers_matching_normal() {
        // Two coincident vertices on the right with different normals
        let points = vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ];
        let normals = vec![
            Vec3::new(-1.0, 1.0, 0.0).normalize(),
            Vec3::Y,
            Vec3::new(1.0, 1.0, 0.0).normalize(),
        ];
        let mut relation = vec![0; 3];
        build_mirror_relation(&points, &normals, Vec3::X, 1e-4, &mut relation);
        assert_eq!(relation[0], 2);
    }

    #[test]
    fn test_apply_reads_from_snapshot() {
        let relation = vec![0, 0, 1];
        let mut normals = vec![Vec3::new(0.6, 0.8, 0.0), Vec3::Z, Vec3::Y];
        apply_mirroring(&relation, Vec3::X, &mut normals);
        assert_eq!(normals[1], Vec3::new(-0.6, 0.8, 0.0));
        // Vertex 2 reads vertex 1's value from before this pass
        assert_eq!(normals[2], Vec3::Z);
    }
}
