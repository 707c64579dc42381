//! Raster backend trait and shared types.
//!
//! The [`Rasterizer`] trait turns an SVG document into PNG bytes. The
//! production implementation is
//! [`ResvgBackend`](super::resvg_backend::ResvgBackend), which renders in
//! process with no browser or external binary.

use super::params::{Dimensions, PngParams};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SVG parse failed: {0}")]
    Svg(String),
    #[error("Rendering failed: {0}")]
    RenderFailed(String),
    #[error("PNG encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Trait for SVG rasterizers.
///
/// Must be `Sync`: the render stage fans jobs out over a rayon pool and the
/// server shares one backend across request handlers.
pub trait Rasterizer: Sync {
    /// Rasterize `svg` at `size` and encode it as PNG.
    fn render_png(&self, svg: &str, size: Dimensions) -> Result<Vec<u8>, BackendError>;

    /// Rasterize and write the PNG to `params.output`, creating parent dirs.
    fn write_png(&self, params: &PngParams) -> Result<(), BackendError> {
        let bytes = self.render_png(&params.svg, params.size)?;
        if let Some(parent) = params.output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&params.output, bytes)?;
        Ok(())
    }
}
