//! Baking normals out to colors or textures and loading them back

use std::path::Path;

use geometry::GeometryKernel;
use normalpaint_config::NormalMapEncoding;
use tracing::info;

use crate::bake::{
    NormalMapImage, decode_vertex_colors, encode_normal_map, encode_vertex_colors,
    rasterize_normal_map, tangent_to_object, unpack_texel,
};
use crate::error::EditError;
use crate::history::{HistoryPort, MeshRecord};

use super::NormalEditor;

impl<K: GeometryKernel, P: HistoryPort> NormalEditor<K, P> {
    /// Encode posed normals into the mesh's vertex colors.
    pub fn bake_to_vertex_color(&mut self, push_undo: bool) {
        if push_undo {
            let before = MeshRecord::colors(&self.mesh, self.mesh.borrow().colors.clone());
            self.push_undo_with(None, vec![before]);
        }

        let colors = encode_vertex_colors(&self.live.buffers.posed.normals);
        {
            let mut asset = self.mesh.borrow_mut();
            asset.colors.clone_from(&colors);
            asset.upload();
        }

        if push_undo {
            let after = MeshRecord::colors(&self.mesh, colors);
            self.push_undo_with(None, vec![after]);
        }
    }

    /// Decode the mesh's vertex colors back into normals. Returns false
    /// when there is not exactly one color per vertex.
    pub fn load_vertex_color(&mut self, push_undo: bool) -> bool {
        let normals = {
            let asset = self.mesh.borrow();
            if asset.colors.len() != self.live.vertex_count() {
                return false;
            }
            decode_vertex_colors(&asset.colors)
        };
        self.live.buffers.posed.normals = normals;
        self.finish_edit(push_undo);
        true
    }

    /// Take normals from a tangent-space normal map sampled at each
    /// vertex UV, relative to the base normals and tangents.
    ///
    /// `packed` maps store X in alpha and Y in green.
    pub fn load_normal_map(
        &mut self,
        image: &NormalMapImage,
        packed: bool,
        push_undo: bool,
    ) -> Result<(), EditError> {
        if image.is_empty() {
            return Err(EditError::MissingInput("normal map"));
        }
        if self.live.uv.is_empty() {
            return Err(EditError::MissingInput("uv"));
        }

        let posed = &mut self.live.buffers.posed;
        for (i, n) in posed.normals.iter_mut().enumerate() {
            let (Some(uv), Some(base), Some(tangent)) = (
                self.live.uv.get(i),
                posed.normals_base.get(i),
                posed.tangents_base.get(i),
            ) else {
                continue;
            };
            let ts = unpack_texel(image.sample(*uv), packed);
            *n = tangent_to_object(ts, *base, *tangent);
        }
        self.finish_edit(push_undo);
        Ok(())
    }

    /// [`Self::load_normal_map`] from an image file.
    pub fn load_normal_map_file(
        &mut self,
        path: impl AsRef<Path>,
        packed: bool,
        push_undo: bool,
    ) -> Result<(), EditError> {
        let image = NormalMapImage::open(path)?;
        self.load_normal_map(&image, packed, push_undo)
    }

    /// Bake a tangent-space normal map and write it to `path`.
    ///
    /// The display renders it when it can; otherwise it is rasterized here.
    /// `.png` paths get 8-bit PNG, anything else EXR. An empty path does
    /// nothing and returns `Ok(false)`.
    pub fn bake_to_texture(
        &mut self,
        width: u32,
        height: u32,
        path: impl AsRef<Path>,
    ) -> Result<bool, EditError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(false);
        }

        let map = match self.display.bake_normal_map(width, height) {
            Some(map) => map,
            None => {
                if self.live.uv.is_empty() {
                    return Err(EditError::MissingInput("uv"));
                }
                let posed = &self.live.buffers.posed;
                rasterize_normal_map(
                    &self.live.indices,
                    &self.live.uv,
                    &posed.normals,
                    &posed.normals_base,
                    &posed.tangents_base,
                    width,
                    height,
                )
            }
        };
        let bytes = encode_normal_map(&map, NormalMapEncoding::from_path(path))?;
        self.writer.write(path, &bytes)?;
        info!(
            "Baked {}x{} normal map to {}",
            map.width,
            map.height,
            path.display()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::quad_editor;
    use super::*;
    use crate::display::{AssetWriter, BakedNormalMap, DisplaySink};
    use glam::{Mat4, Vec3, Vec4};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    type Written = Rc<RefCell<Vec<(PathBuf, Vec<u8>)>>>;

    struct MemoryWriter(Written);

    impl AssetWriter for MemoryWriter {
        fn write(&mut self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
            self.0.borrow_mut().push((path.to_path_buf(), bytes.to_vec()));
            Ok(())
        }
    }

    /// Display that renders every bake as a solid color.
    struct SolidBake(Vec4);

    impl DisplaySink for SolidBake {
        fn bake_normal_map(&mut self, width: u32, height: u32) -> Option<BakedNormalMap> {
            Some(BakedNormalMap {
                width,
                height,
                pixels: vec![self.0; width as usize * height as usize],
            })
        }
    }

    #[test]
    fn test_vertex_color_round_trip_with_history() {
        let mut editor = quad_editor();
        editor.bake_to_vertex_color(true);
        assert_eq!(editor.history().len(), 2);
        assert_eq!(
            editor.mesh().borrow().colors,
            vec![Vec4::new(0.5, 0.5, 1.0, 1.0); 4]
        );

        editor.live.buffers.posed.normals.fill(Vec3::X);
        assert!(editor.load_vertex_color(false));
        assert!(editor.normals().iter().all(|n| *n == Vec3::Z));

        // Undo restores the colors the mesh had before
        editor.history_mut().port_mut().undo();
        editor.on_undo_redo(Mat4::IDENTITY, &[]);
        assert!(editor.mesh().borrow().colors.is_empty());
        assert!(!editor.load_vertex_color(false));
    }

    #[test]
    fn test_load_normal_map() {
        let mut editor = quad_editor();
        let tilted = NormalMapImage::new(1, 1, vec![Vec4::new(1.0, 0.5, 0.5, 1.0)]);
        editor.load_normal_map(&tilted, false, true).unwrap();
        assert!(editor.normals().iter().all(|n| n.distance(Vec3::X) < 1e-5));
        assert_eq!(editor.history().len(), 1);

        // Packed: X from alpha, Y from green
        let packed = NormalMapImage::new(1, 1, vec![Vec4::new(0.0, 1.0, 0.0, 0.5)]);
        editor.load_normal_map(&packed, true, false).unwrap();
        assert!(editor.normals().iter().all(|n| n.distance(Vec3::Y) < 1e-5));
    }

    #[test]
    fn test_load_normal_map_needs_input() {
        let mut editor = quad_editor();
        let empty = NormalMapImage::new(0, 0, Vec::new());
        assert!(matches!(
            editor.load_normal_map(&empty, false, false),
            Err(EditError::MissingInput(_))
        ));
        assert!(editor.load_normal_map_file("/nonexistent/normals.png", false, false).is_err());
    }

    #[test]
    fn test_bake_to_texture_cpu_fallback() {
        let written = Written::default();
        let mut editor = quad_editor().with_writer(Box::new(MemoryWriter(written.clone())));

        assert!(!editor.bake_to_texture(8, 8, "").unwrap());
        assert!(written.borrow().is_empty());

        assert!(editor.bake_to_texture(8, 8, "normals.png").unwrap());
        let written = written.borrow();
        let (path, bytes) = &written[0];
        assert_eq!(path, &PathBuf::from("normals.png"));
        let decoded = image::load_from_memory(bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        let p = decoded.get_pixel(3, 3);
        assert_eq!((p[0], p[1], p[2]), (128, 128, 255));
    }

    #[test]
    fn test_bake_to_texture_prefers_display() {
        let written = Written::default();
        let mut editor = quad_editor()
            .with_display(Box::new(SolidBake(Vec4::new(1.0, 0.0, 0.0, 1.0))))
            .with_writer(Box::new(MemoryWriter(written.clone())));

        assert!(editor.bake_to_texture(2, 2, "normals.png").unwrap());
        let written = written.borrow();
        let decoded = image::load_from_memory(&written[0].1).unwrap().to_rgba8();
        let p = decoded.get_pixel(1, 1);
        assert_eq!((p[0], p[1], p[2], p[3]), (255, 0, 0, 255));
    }
}
