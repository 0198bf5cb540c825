//! Selection & pivot tracker.

use geometry::SelectionSummary;
use glam::{Quat, Vec3};

/// Soft per-vertex selection and the pivot derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    /// One weight in [0, 1] per vertex
    pub weights: Vec<f32>,
    num_selected: usize,
    pivot_position: Vec3,
    pivot_normal: Vec3,
    pivot_rotation: Quat,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SelectionState {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            weights: vec![0.0; vertex_count],
            num_selected: 0,
            pivot_position: Vec3::ZERO,
            pivot_normal: Vec3::ZERO,
            pivot_rotation: Quat::IDENTITY,
        }
    }

    /// Vertices with a non-zero weight, as of the last summary.
    pub fn num_selected(&self) -> usize {
        self.num_selected
    }

    pub fn has_selection(&self) -> bool {
        self.num_selected > 0
    }

    pub fn pivot_position(&self) -> Vec3 {
        self.pivot_position
    }

    pub fn pivot_normal(&self) -> Vec3 {
        self.pivot_normal
    }

    pub fn pivot_rotation(&self) -> Quat {
        self.pivot_rotation
    }

    /// Take a fresh summary from the kernel.
    ///
    /// Returns whether the weights need re-uploading, which is every time
    /// except when nothing was selected before or after.
    pub fn apply_summary(&mut self, summary: SelectionSummary) -> bool {
        let previous = self.num_selected;
        self.num_selected = summary.count;
        self.pivot_position = summary.position;
        self.pivot_normal = summary.normal;
        self.pivot_rotation = if summary.count > 0 {
            look_rotation(summary.normal)
        } else {
            Quat::IDENTITY
        };
        !(previous == 0 && summary.count == 0)
    }

    /// Every weight to 1. Returns whether there was anything to select.
    pub fn select_all(&mut self) -> bool {
        self.weights.fill(1.0);
        !self.weights.is_empty()
    }

    /// Every weight to 1 - weight.
    pub fn invert(&mut self) -> bool {
        for w in &mut self.weights {
            *w = 1.0 - *w;
        }
        !self.weights.is_empty()
    }

    /// Every weight to 0. Returns whether there was anything to clear.
    pub fn clear(&mut self) -> bool {
        self.weights.fill(0.0);
        !self.weights.is_empty()
    }
}

/// Orientation whose forward (+Z) axis points along `forward`.
fn look_rotation(forward: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::Z, forward)
    }
}
