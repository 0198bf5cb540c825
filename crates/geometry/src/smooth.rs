//! Radius smoothing and welding of split normals.

use glam::{Mat4, Vec3};

use crate::brush::renormalize;
use crate::grid::PointGrid;
use crate::types::{ModelData, WeldModel, WeldScope};

/// Whether two unit vectors are within `angle_deg` of each other.
fn within_angle(a: Vec3, b: Vec3, angle_deg: f32) -> bool {
    if angle_deg >= 180.0 {
        return true;
    }
    a.dot(b) >= angle_deg.to_radians().cos()
}

/// Blend every vertex toward the average normal of its neighbours within
/// `radius` (world space).
pub fn smooth(model: &mut ModelData<'_>, radius: f32, strength: f32, mask: bool) -> usize {
    if radius <= 0.0 || strength == 0.0 {
        return 0;
    }
    let world: Vec<Vec3> = (0..model.vertex_count())
        .map(|i| model.world_point(i))
        .collect();
    let grid = PointGrid::new(&world, radius);
    let source = model.normals.to_vec();

    let mut touched = 0;
    for (i, &p) in world.iter().enumerate() {
        let w = (strength * model.mask_weight(i, mask)).clamp(0.0, 1.0);
        if w <= 0.0 {
            continue;
        }
        let mut average = Vec3::ZERO;
        grid.for_each_near(p, radius, |j| average += source[j]);
        let average = average.normalize_or_zero();
        if average == Vec3::ZERO {
            continue;
        }
        model.normals[i] = renormalize(source[i].lerp(average, w), source[i]);
        touched += 1;
    }
    touched
}

/// Unify the normals of coincident vertices.
///
/// With `smoothing` every member of a group gets the group's average normal,
/// otherwise the lowest-indexed member's normal is copied to the others.
/// Members further than `angle_deg` from the welded normal keep their own.
/// With `mask` only selected vertices take part.
pub fn weld(
    model: &mut ModelData<'_>,
    epsilon: f32,
    smoothing: bool,
    angle_deg: f32,
    mask: bool,
) -> usize {
    let count = model.vertex_count();
    let grid = PointGrid::new(model.points, epsilon);
    let participates: Vec<bool> = (0..count)
        .map(|i| model.mask_weight(i, mask) > 0.0)
        .collect();
    let mut grouped = vec![false; count];
    let mut touched = 0;

    for i in 0..count {
        if grouped[i] || !participates[i] {
            continue;
        }
        let group: Vec<usize> = grid
            .query(model.points[i], epsilon)
            .into_iter()
            .filter(|&j| participates[j] && !grouped[j])
            .collect();
        if group.len() < 2 {
            continue;
        }

        let welded = if smoothing {
            group
                .iter()
                .map(|&j| model.normals[j])
                .sum::<Vec3>()
                .normalize_or_zero()
        } else {
            model.normals[group[0]]
        };
        if welded == Vec3::ZERO {
            continue;
        }

        for &j in &group {
            grouped[j] = true;
            if within_angle(model.normals[j], welded, angle_deg) {
                model.normals[j] = welded;
                touched += 1;
            }
        }
    }
    touched
}

/// Weld the edited mesh against other meshes in world space.
///
/// Each edited vertex is matched with every target vertex within `epsilon`
/// whose normal is within `angle_deg` of its own. The welded normal is the
/// edited normal when only targets are written, the targets' average when
/// only the edited mesh is written, and the average of both otherwise.
/// Returns the number of edited vertices that found a match. Vertices
/// without a normal, on either side, take no part.
pub fn weld_multi(
    model: &mut ModelData<'_>,
    targets: &mut [WeldModel<'_>],
    scope: WeldScope,
    epsilon: f32,
    angle_deg: f32,
    mask: bool,
) -> usize {
    struct Indexed {
        grid: PointGrid,
        inverse: Mat4,
        world_normals: Vec<Vec3>,
    }

    let indexed: Vec<Indexed> = targets
        .iter()
        .map(|t| {
            let world: Vec<Vec3> = t
                .points
                .iter()
                .take(t.normals.len())
                .map(|p| t.transform.transform_point3(*p))
                .collect();
            Indexed {
                grid: PointGrid::new(&world, epsilon),
                inverse: t.transform.inverse(),
                world_normals: t
                    .normals
                    .iter()
                    .map(|n| t.transform.transform_vector3(*n).normalize_or_zero())
                    .collect(),
            }
        })
        .collect();
    let model_inverse = model.transform.inverse();

    let mut matched = 0;
    for i in 0..model.vertex_count().min(model.normals.len()) {
        if model.mask_weight(i, mask) <= 0.0 {
            continue;
        }
        let p = model.world_point(i);
        let n = model.world_normal(i);

        let mut hits: Vec<(usize, usize)> = Vec::new();
        let mut target_sum = Vec3::ZERO;
        for (t, index) in indexed.iter().enumerate() {
            index.grid.for_each_near(p, epsilon, |j| {
                let tn = index.world_normals[j];
                if within_angle(n, tn, angle_deg) {
                    hits.push((t, j));
                    target_sum += tn;
                }
            });
        }
        if hits.is_empty() {
            continue;
        }

        let welded = match scope {
            WeldScope::TargetsOnly => n,
            WeldScope::SelfOnly => target_sum.normalize_or_zero(),
            WeldScope::Both => (target_sum + n).normalize_or_zero(),
        };
        if welded == Vec3::ZERO {
            continue;
        }

        if scope.writes_self() {
            model.normals[i] = model_inverse.transform_vector3(welded).normalize_or_zero();
        }
        if scope.writes_targets() {
            for &(t, j) in &hits {
                targets[t].normals[j] =
                    indexed[t].inverse.transform_vector3(welded).normalize_or_zero();
            }
        }
        matched += 1;
    }
    matched
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
        fn new(points: Vec<Vec3>, normals: Vec<Vec3>) -> Self {
            let count = points.len();
            Self {
                points,
                normals,
                tangents: Vec::new(),
                selection: vec![0.0; count],
            }
        }

        fn model(&mut self) -> ModelData<'_> {
            ModelData {
                indices: &[],
                points: &self.points,
                normals: &mut self.normals,
                tangents: &mut self.tangents,
                uv: &[],
                selection: &mut self.selection,
                transform: Mat4::IDENTITY,
            }
        }
    }

    fn seam() -> Buffers {
        Buffers::new(
            vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)],
            vec![Vec3::X, Vec3::Y, Vec3::Z],
        )
    }

    #[test]
    fn test_smooth_ignores_far_vertices() {
        let mut b = seam();
        let touched = smooth(&mut b.model(), 1.0, 1.0, false);
        assert_eq!(touched, 3);
        let average = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(b.normals[0].distance(average) < 1e-5);
        assert!(b.normals[1].distance(average) < 1e-5);
        assert_eq!(b.normals[2], Vec3::Z);
    }

    #[test]
    fn test_weld_smoothing_averages_group() {
        let mut b = seam();
        let touched = weld(&mut b.model(), 1e-4, true, 180.0, false);
        assert_eq!(touched, 2);
        assert_eq!(b.normals[0], b.normals[1]);
        assert_eq!(b.normals[2], Vec3::Z);
    }

    #[test]
    fn test_weld_without_smoothing_copies_first() {
        let mut b = seam();
        weld(&mut b.model(), 1e-4, false, 180.0, false);
        assert_eq!(b.normals[1], Vec3::X);
    }

    #[test]
    fn test_weld_angle_keeps_hard_edges() {
        let mut b = seam();
        let touched = weld(&mut b.model(), 1e-4, false, 30.0, false);
        // The lowest member matches itself; the other is 90 degrees off
        assert_eq!(touched, 1);
        assert_eq!(b.normals[1], Vec3::Y);
    }

    #[test]
    fn test_weld_multi_scopes() {
        let target_points = vec![Vec3::new(1.0, 0.0, 0.0)];
        // The target sits at the origin once its transform is applied
        let target_transform = Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0));

        for (scope, expect_self, expect_target) in [
            (WeldScope::TargetsOnly, Vec3::X, Vec3::X),
            (WeldScope::SelfOnly, Vec3::Y, Vec3::Y),
            (
                WeldScope::Both,
                Vec3::new(1.0, 1.0, 0.0).normalize(),
                Vec3::new(1.0, 1.0, 0.0).normalize(),
            ),
        ] {
            let mut b = Buffers::new(vec![Vec3::ZERO], vec![Vec3::X]);
            let mut target_normals = vec![Vec3::Y];
            let mut targets = [WeldModel {
                points: &target_points,
                normals: &mut target_normals,
                transform: target_transform,
            }];
            let matched = weld_multi(&mut b.model(), &mut targets, scope, 1e-4, 180.0, false);
            assert_eq!(matched, 1);
            assert!(b.normals[0].distance(expect_self) < 1e-5, "{scope:?}");
            assert!(target_normals[0].distance(expect_target) < 1e-5, "{scope:?}");
        }
    }

    #[test]
    fn test_weld_multi_skips_points_without_normals() {
        // Two coincident target points but only one normal
        let target_points = vec![Vec3::ZERO, Vec3::ZERO];
        let mut target_normals = vec![Vec3::Y];
        let mut targets = [WeldModel {
            points: &target_points,
            normals: &mut target_normals,
            transform: Mat4::IDENTITY,
        }];
        let mut b = Buffers::new(vec![Vec3::ZERO, Vec3::ZERO], vec![Vec3::X]);

        let matched = weld_multi(&mut b.model(), &mut targets, WeldScope::Both, 1e-4, 180.0, false);
        assert_eq!(matched, 1);
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(b.normals[0].distance(expected) < 1e-5);
        assert!(target_normals[0].distance(expected) < 1e-5);
    }
}
