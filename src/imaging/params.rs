//! Parameter types for raster operations.
//!
//! These structs describe *what* to render, not *how*. They sit between the
//! high-level [`operations`](super::operations) module (which decides which
//! share images exist) and the [`backend`](super::backend) (which does the
//! pixel work), so tests can swap in a recording backend.

use std::path::PathBuf;

/// Pixel size of a rasterized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// The 1200×630 Open Graph card size.
    pub const SHARE_CARD: Dimensions = Dimensions {
        width: crate::share_image::WIDTH,
        height: crate::share_image::HEIGHT,
    };

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Full specification of one PNG write: SVG source, target file, size.
#[derive(Debug, Clone, PartialEq)]
pub struct PngParams {
    pub svg: String,
    pub output: PathBuf,
    pub size: Dimensions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_card_is_open_graph_size() {
        assert_eq!(Dimensions::SHARE_CARD.width, 1200);
        assert_eq!(Dimensions::SHARE_CARD.height, 630);
        assert_eq!(Dimensions::SHARE_CARD.pixel_count(), 756_000);
    }
}
