//! Display and persistence collaborators.

use std::path::Path;

use glam::{Vec3, Vec4};

/// A baked tangent-space normal map, RGBA in [0, 1], rows from the top.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedNormalMap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

/// Receives posed buffer snapshots for visualization.
///
/// Uploads are fire-and-forget; a sink may ignore any of them.
pub trait DisplaySink {
    fn upload_points(&mut self, _points: &[Vec3]) {}

    fn upload_normals(&mut self, _normals: &[Vec3]) {}

    fn upload_tangents(&mut self, _tangents: &[Vec4]) {}

    fn upload_base(&mut self, _normals: &[Vec3], _tangents: &[Vec4]) {}

    fn upload_selection(&mut self, _selection: &[f32]) {}

    /// Render a normal map on the GPU. `None` lets the editor bake on the CPU.
    fn bake_normal_map(&mut self, _width: u32, _height: u32) -> Option<BakedNormalMap> {
        None
    }
}

/// Display that drops every upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {}

/// Raw byte persistence.
pub trait AssetWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

/// Writes straight to the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl AssetWriter for FsWriter {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, bytes)
    }
}
