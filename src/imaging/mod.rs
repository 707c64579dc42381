//! Share-image rasterization: SVG template in, PNG out.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Parse SVG** | `usvg::Tree::from_str` |
//! | **Rasterize** | `resvg::render` → `tiny_skia::Pixmap` |
//! | **Encode PNG** | `image` crate |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing a raster job
//! - **Backend**: [`Rasterizer`] trait + [`ResvgBackend`]
//! - **Operations**: High-level functions combining the template + backend

pub mod backend;
pub mod operations;
mod params;
pub mod resvg_backend;

pub use backend::{BackendError, Rasterizer};
pub use operations::{IMAGE_FILENAME, plan_share_png, render_share_png, write_share_png};
pub use params::{Dimensions, PngParams};
pub use resvg_backend::ResvgBackend;
