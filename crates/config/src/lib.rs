//! Shared configuration for normalpaint
//!
//! This crate provides the single source of truth for editor settings that
//! outlive a single editing session: mirror symmetry, tangent update policy,
//! the coordinate frame used by transform tools, the brush shape and the
//! weld threshold. Settings round-trip through JSON so they can be exported
//! and shared between projects.

pub mod brush;

use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use brush::{BrushSettings, FalloffCurve, PaintBlend};

/// Positional tolerance for matching a vertex with its mirror counterpart.
///
/// Tunable through [`EditorSettings::mirror_epsilon`].
pub const DEFAULT_MIRROR_EPSILON: f32 = 0.0001;

/// Default weld threshold in degrees
pub const DEFAULT_WELD_ANGLE: f32 = 180.0;

/// Default radius for the smoothing tool in world units
pub const DEFAULT_SMOOTH_RADIUS: f32 = 1.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which half of the mesh drives the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MirrorMode {
    #[default]
    None,
    RightToLeft,
    LeftToRight,
    ForwardToBack,
    BackToForward,
    UpToDown,
    DownToUp,
}

impl MirrorMode {
    /// Normal of the mirror plane, pointing into the side that receives
    /// mirrored normals.
    pub fn plane_normal(&self) -> Vec3 {
        match self {
            MirrorMode::RightToLeft => Vec3::NEG_X,
            MirrorMode::LeftToRight => Vec3::X,
            MirrorMode::ForwardToBack => Vec3::NEG_Z,
            MirrorMode::BackToForward => Vec3::Z,
            MirrorMode::UpToDown => Vec3::NEG_Y,
            MirrorMode::DownToUp | MirrorMode::None => Vec3::Y,
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != MirrorMode::None
    }
}

/// When tangents are recomputed after normals change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TangentsUpdateMode {
    /// Only on explicit request
    #[default]
    Manual,
    /// After every history push
    Auto,
    /// After every normal update
    Realtime,
}

/// How tangents are recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TangentsPrecision {
    /// Kernel-side approximation
    #[default]
    Fast,
    /// The mesh asset's own tangent generation
    Precise,
}

/// Coordinate frame for directions, rotations and scales given to tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Coordinate {
    #[default]
    World,
    Local,
    Pivot,
}

/// Encoding used when a normal map is baked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalMapEncoding {
    /// 8-bit per channel
    #[default]
    Png,
    /// High dynamic range
    Exr,
}

impl NormalMapEncoding {
    /// `.png` paths bake to PNG, everything else to EXR.
    pub fn from_path(path: &Path) -> Self {
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            NormalMapEncoding::Png
        } else {
            NormalMapEncoding::Exr
        }
    }
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Active mirror mode
    pub mirror_mode: MirrorMode,
    /// Tolerance for mirror counterpart matching
    pub mirror_epsilon: f32,
    /// Tangent update policy
    pub tangents_mode: TangentsUpdateMode,
    /// Tangent generation method
    pub tangents_precision: TangentsPrecision,
    /// Frame used by transform tools
    pub coordinate: Coordinate,
    /// Pivot position in world space
    pub pivot_position: Vec3,
    /// Pivot orientation in world space
    pub pivot_rotation: Quat,
    /// Brush shape
    pub brush: BrushSettings,
    /// Normals further apart than this (degrees) are not welded
    pub weld_angle: f32,
    /// Smoothing tool radius
    pub smooth_radius: f32,
    /// Screen-space selection ignores back faces
    pub select_front_face_only: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            mirror_mode: MirrorMode::None,
            mirror_epsilon: DEFAULT_MIRROR_EPSILON,
            tangents_mode: TangentsUpdateMode::default(),
            tangents_precision: TangentsPrecision::default(),
            coordinate: Coordinate::default(),
            pivot_position: Vec3::ZERO,
            pivot_rotation: Quat::IDENTITY,
            brush: BrushSettings::default(),
            weld_angle: DEFAULT_WELD_ANGLE,
            smooth_radius: DEFAULT_SMOOTH_RADIUS,
            select_front_face_only: true,
        }
    }
}

impl EditorSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export settings to a JSON file, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load settings exported with [`EditorSettings::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
