//! In-process SVG rasterizer built on resvg.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Parse SVG | `usvg::Tree::from_str` |
//! | Font lookup | `fontdb` (system fonts + configured font dirs) |
//! | Rasterize | `resvg::render` into a `tiny_skia::Pixmap` |
//! | Encode PNG | `image::RgbaImage::write_to` |
//!
//! The font database is loaded once per backend and shared with every parse
//! through an `Arc`, so rendering many cards does not rescan the system.

use super::backend::{BackendError, Rasterizer};
use super::params::Dimensions;
use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ResvgBackend {
    fontdb: Arc<fontdb::Database>,
}

impl ResvgBackend {
    /// Backend with system fonts plus every font found under `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            db.load_fonts_dir(dir);
        }
        tracing::debug!(faces = db.len(), "font database loaded");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Rasterize to straight-alpha RGBA pixels.
    pub fn rasterize(&self, svg: &str, size: Dimensions) -> Result<RgbaImage, BackendError> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| BackendError::Svg(e.to_string()))?;

        let mut pixmap = Pixmap::new(size.width, size.height).ok_or_else(|| {
            BackendError::RenderFailed(format!("invalid size {}x{}", size.width, size.height))
        })?;
        let tree_size = tree.size();
        let transform = Transform::from_scale(
            size.width as f32 / tree_size.width(),
            size.height as f32 / tree_size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let mut raw = Vec::with_capacity(size.pixel_count() * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(size.width, size.height, raw)
            .ok_or_else(|| BackendError::RenderFailed("pixel buffer size mismatch".to_string()))
    }
}

impl Rasterizer for ResvgBackend {
    fn render_png(&self, svg: &str, size: Dimensions) -> Result<Vec<u8>, BackendError> {
        let img = self.rasterize(svg, size)?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
<rect x="0" y="0" width="10" height="10" fill="#ff0000"/>
<rect x="5" y="5" width="5" height="5" fill="#0000ff"/>
</svg>"##;

    #[test]
    fn rasterize_fills_pixels() {
        let backend = ResvgBackend::new(&[]);
        let img = backend
            .rasterize(SQUARE, Dimensions { width: 10, height: 10 })
            .unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(8, 8).0, [0, 0, 255, 255]);
    }

    #[test]
    fn rasterize_scales_to_requested_size() {
        let backend = ResvgBackend::new(&[]);
        let img = backend
            .rasterize(SQUARE, Dimensions { width: 20, height: 20 })
            .unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(img.get_pixel(17, 17).0, [0, 0, 255, 255]);
    }

    #[test]
    fn render_png_produces_decodable_png() {
        let backend = ResvgBackend::new(&[]);
        let bytes = backend
            .render_png(SQUARE, Dimensions { width: 10, height: 10 })
            .unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn malformed_svg_is_an_error() {
        let backend = ResvgBackend::new(&[]);
        let err = backend
            .render_png("<svg", Dimensions { width: 10, height: 10 })
            .unwrap_err();
        assert!(matches!(err, BackendError::Svg(_)));
    }

    #[test]
    fn zero_size_is_an_error() {
        let backend = ResvgBackend::new(&[]);
        let err = backend
            .rasterize(SQUARE, Dimensions { width: 0, height: 10 })
            .unwrap_err();
        assert!(matches!(err, BackendError::RenderFailed(_)));
    }
}
