//! Conversions between normals and colors or textures.

use std::io::Cursor;
use std::path::Path;

use geometry::raycast::triangle_indices;
use glam::{Vec2, Vec3, Vec4};
use image::{DynamicImage, ImageFormat, Rgba32FImage};
use normalpaint_config::NormalMapEncoding;

use crate::display::BakedNormalMap;
use crate::error::EditError;

/// Flat tangent-space normal, used for texels no triangle covers.
const FLAT_TEXEL: Vec4 = Vec4::new(0.5, 0.5, 1.0, 1.0);

pub fn encode_vertex_colors(normals: &[Vec3]) -> Vec<Vec4> {
    normals
        .iter()
        .map(|n| (*n * 0.5 + 0.5).extend(1.0))
        .collect()
}

pub fn decode_vertex_colors(colors: &[Vec4]) -> Vec<Vec3> {
    colors
        .iter()
        .map(|c| c.truncate() * 2.0 - 1.0)
        .collect()
}

/// Pixels in a `width` x `height` image, without `u32` overflow.
fn texel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// RGBA texels in [0, 1], rows from the top.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMapImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl NormalMapImage {
    pub fn new(width: u32, height: u32, pixels: Vec<Vec4>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decode any image format the `image` crate reads.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let rgba = image::open(path)?.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|p| Vec4::new(p[0], p[1], p[2], p[3]))
            .collect();
        Ok(Self::new(width, height, pixels))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.pixels.len() < texel_count(self.width, self.height)
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Bilinear sample with wrapping. UV (0, 0) is the bottom-left corner.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.is_empty() {
            return FLAT_TEXEL;
        }
        let x = uv.x * self.width as f32 - 0.5;
        let y = (1.0 - uv.y) * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}

/// Tangent-space direction stored in a texel. Packed maps keep X in alpha
/// and Y in green and rebuild Z.
pub fn unpack_texel(texel: Vec4, packed: bool) -> Vec3 {
    if packed {
        let x = texel.w * 2.0 - 1.0;
        let y = texel.y * 2.0 - 1.0;
        let z = (1.0 - x * x - y * y).max(0.0).sqrt();
        Vec3::new(x, y, z)
    } else {
        texel.truncate() * 2.0 - 1.0
    }
}

/// Tangent-space direction to the space of `normal`/`tangent`.
pub fn tangent_to_object(ts: Vec3, normal: Vec3, tangent: Vec4) -> Vec3 {
    let t = tangent.truncate();
    let b = normal.cross(t) * tangent.w;
    (t * ts.x + b * ts.y + normal * ts.z).normalize_or_zero()
}

/// Object-space direction to the tangent space of `normal`/`tangent`.
pub fn object_to_tangent(n: Vec3, normal: Vec3, tangent: Vec4) -> Vec3 {
    let t = tangent.truncate();
    let b = normal.cross(t) * tangent.w;
    Vec3::new(n.dot(t), n.dot(b), n.dot(normal))
}

/// Rasterize a tangent-space normal map in UV space.
///
/// `normals` are the edited normals, expressed relative to the base normals
/// and tangents of the same vertices.
pub fn rasterize_normal_map(
    indices: &[u32],
    uv: &[Vec2],
    normals: &[Vec3],
    base_normals: &[Vec3],
    base_tangents: &[Vec4],
    width: u32,
    height: u32,
) -> BakedNormalMap {
    let mut pixels = vec![FLAT_TEXEL; texel_count(width, height)];
    let count = uv
        .len()
        .min(normals.len())
        .min(base_normals.len())
        .min(base_tangents.len());

    for tri in 0..indices.len() / 3 {
        let corners = triangle_indices(indices, tri);
        if corners.iter().any(|&v| v >= count) {
            continue;
        }
        let [a, b, c] = corners;
        let size = Vec2::new(width as f32, height as f32);
        // Texel space with y down
        let to_texel = |v: usize| Vec2::new(uv[v].x, 1.0 - uv[v].y) * size;
        let (pa, pb, pc) = (to_texel(a), to_texel(b), to_texel(c));
        let area = (pb - pa).perp_dot(pc - pa);
        if area.abs() < 1e-12 {
            continue;
        }

        let min = pa.min(pb).min(pc).floor().max(Vec2::ZERO);
        let max = pa.max(pb).max(pc).ceil().min(size);
        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let wa = (pc - pb).perp_dot(p - pb) / area;
                let wb = (pa - pc).perp_dot(p - pc) / area;
                let wc = 1.0 - wa - wb;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }
                let n = (normals[a] * wa + normals[b] * wb + normals[c] * wc).normalize_or_zero();
                let base = (base_normals[a] * wa + base_normals[b] * wb + base_normals[c] * wc)
                    .normalize_or_zero();
                let tangent = base_tangents[a] * wa + base_tangents[b] * wb + base_tangents[c] * wc;
                let tangent = tangent
                    .truncate()
                    .normalize_or_zero()
                    .extend(if tangent.w < 0.0 { -1.0 } else { 1.0 });
                let ts = object_to_tangent(n, base, tangent);
                pixels[y as usize * width as usize + x as usize] = (ts * 0.5 + 0.5).extend(1.0);
            }
        }
    }

    BakedNormalMap {
        width,
        height,
        pixels,
    }
}

/// Encode a baked map: 8-bit PNG or 32-bit float EXR.
pub fn encode_normal_map(
    map: &BakedNormalMap,
    encoding: NormalMapEncoding,
) -> Result<Vec<u8>, EditError> {
    let raw: Vec<f32> = map.pixels.iter().flat_map(|p| p.to_array()).collect();
    let buffer = Rgba32FImage::from_raw(map.width, map.height, raw)
        .ok_or(EditError::MissingInput("baked normal map pixels"))?;
    let image = DynamicImage::ImageRgba32F(buffer);

    let mut bytes = Vec::new();
    match encoding {
        NormalMapEncoding::Png => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        NormalMapEncoding::Exr => {
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::OpenExr)?;
        }
    }
    Ok(bytes)
}
