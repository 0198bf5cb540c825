//! Uniform hash grid for coincident-point queries.
//!
//! Mirroring and welding both look for points within a small tolerance of a
//! query position; bucketing by cell keeps that close to linear.

use std::collections::HashMap;

use glam::{IVec3, Vec3};

/// Smallest allowed cell edge, guards against a zero tolerance.
const MIN_CELL_SIZE: f32 = 1e-6;

/// Points bucketed into cubic cells.
#[derive(Debug)]
pub struct PointGrid {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
    points: Vec<Vec3>,
}

impl PointGrid {
    /// Build a grid with cells of `cell_size` (clamped to a small minimum).
    pub fn new(points: &[Vec3], cell_size: f32) -> Self {
        let cell_size = cell_size.max(MIN_CELL_SIZE);
        let mut cells: HashMap<IVec3, Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            cells.entry(Self::key(*p, cell_size)).or_default().push(i);
        }
        Self {
            cell_size,
            cells,
            points: points.to_vec(),
        }
    }

    fn key(p: Vec3, cell_size: f32) -> IVec3 {
        (p / cell_size).floor().as_ivec3()
    }

    /// Visit every point within `radius` of `center`.
    pub fn for_each_near(&self, center: Vec3, radius: f32, mut visit: impl FnMut(usize)) {
        let reach = (radius / self.cell_size).ceil().max(1.0) as i32;
        let base = Self::key(center, self.cell_size);
        let radius_sq = radius * radius;
        for dz in -reach..=reach {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let Some(bucket) = self.cells.get(&(base + IVec3::new(dx, dy, dz))) else {
                        continue;
                    };
                    for &i in bucket {
                        if self.points[i].distance_squared(center) <= radius_sq {
                            visit(i);
                        }
                    }
                }
            }
        }
    }

    /// Indices of every point within `radius` of `center`, ascending.
    pub fn query(&self, center: Vec3, radius: f32) -> Vec<usize> {
        let mut found = Vec::new();
        self.for_each_near(center, radius, |i| found.push(i));
        found.sort_unstable();
        found
    }
}
