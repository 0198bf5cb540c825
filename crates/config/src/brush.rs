//! Brush shape settings.
//!
//! The kernel consumes a brush falloff as a flat table of samples taken from
//! the brush center (index 0) to its rim (last index). [`BrushSettings`] owns
//! the curve and turns it into that table.

use serde::{Deserialize, Serialize};

/// Default brush radius in world units
pub const DEFAULT_BRUSH_RADIUS: f32 = 0.2;

/// Default brush strength
pub const DEFAULT_BRUSH_STRENGTH: f32 = 0.2;

/// Default number of falloff samples handed to the kernel
pub const DEFAULT_BRUSH_SAMPLES: usize = 32;

/// Falloff curve for brush influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FalloffCurve {
    /// strength = 1 - d
    Linear = 0,
    /// Hermite smoothstep
    #[default]
    Smooth = 1,
    /// Quadratic decay
    Sharp = 2,
    /// Full strength within radius
    Constant = 3,
    /// sqrt(1 - d²)
    Sphere = 4,
}

impl FalloffCurve {
    /// Evaluate at a normalized distance (0.0 = center, 1.0 = rim).
    pub fn evaluate(&self, normalized_distance: f32) -> f32 {
        let d = normalized_distance.clamp(0.0, 1.0);
        match self {
            FalloffCurve::Linear => 1.0 - d,
            FalloffCurve::Smooth => {
                let t = 1.0 - d;
                t * t * (3.0 - 2.0 * t)
            }
            FalloffCurve::Sharp => {
                let t = 1.0 - d;
                t * t
            }
            FalloffCurve::Constant => 1.0,
            FalloffCurve::Sphere => (1.0 - d * d).max(0.0).sqrt(),
        }
    }
}

/// How a paint brush combines the current normal with its base direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PaintBlend {
    /// Interpolate toward the base direction
    #[default]
    Lerp = 0,
    /// Add the base direction
    Add = 1,
    /// Subtract the base direction
    Subtract = 2,
}

/// Brush shape and strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    /// Radius in world units
    pub radius: f32,
    /// Strength multiplier, negative values invert the brush
    pub strength: f32,
    /// Falloff from center to rim
    pub falloff: FalloffCurve,
    /// Number of falloff samples
    pub sample_count: usize,
    /// Paint blend mode
    pub blend: PaintBlend,
    /// Restrict brushes to the current selection
    pub use_selection: bool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BRUSH_RADIUS,
            strength: DEFAULT_BRUSH_STRENGTH,
            falloff: FalloffCurve::default(),
            sample_count: DEFAULT_BRUSH_SAMPLES,
            blend: PaintBlend::default(),
            use_selection: false,
        }
    }
}

impl BrushSettings {
    /// Sample the falloff curve into the table the kernel expects.
    ///
    /// Always returns at least two samples so the rim is represented.
    pub fn samples(&self) -> Vec<f32> {
        let count = self.sample_count.max(2);
        let last = (count - 1) as f32;
        (0..count)
            .map(|i| self.falloff.evaluate(i as f32 / last))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falloff_endpoints() {
        for curve in [
            FalloffCurve::Linear,
            FalloffCurve::Smooth,
            FalloffCurve::Sharp,
            FalloffCurve::Sphere,
        ] {
            assert!((curve.evaluate(0.0) - 1.0).abs() < 1e-6);
            assert!(curve.evaluate(1.0).abs() < 1e-6);
        }
        assert_eq!(FalloffCurve::Constant.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_samples_cover_center_to_rim() {
        let brush = BrushSettings {
            falloff: FalloffCurve::Linear,
            sample_count: 5,
            ..Default::default()
        };
        let samples = brush.samples();
        assert_eq!(samples, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_samples_minimum_length() {
        let brush = BrushSettings {
            sample_count: 0,
            ..Default::default()
        };
        assert_eq!(brush.samples().len(), 2);
    }
}
