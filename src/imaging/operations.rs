//! High-level share-image operations.
//!
//! These functions combine the [`ShareCard`] template with backend execution.
//! They take a card, compute parameters, and call the backend.

use super::backend::{BackendError, Rasterizer};
use super::params::{Dimensions, PngParams};
use crate::share_image::ShareCard;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// File name of every rendered share image.
pub const IMAGE_FILENAME: &str = "opengraph-image.png";

/// Plan a share-image write without executing it.
pub fn plan_share_png(card: &ShareCard, output: &Path) -> PngParams {
    PngParams {
        svg: card.to_svg_string(),
        output: output.to_path_buf(),
        size: Dimensions::SHARE_CARD,
    }
}

/// Render a share image to PNG bytes (used by the server).
pub fn render_share_png(backend: &(impl Rasterizer + ?Sized), card: &ShareCard) -> Result<Vec<u8>> {
    backend.render_png(&card.to_svg_string(), Dimensions::SHARE_CARD)
}

/// Render a share image and write it to `output`.
pub fn write_share_png(backend: &(impl Rasterizer + ?Sized), card: &ShareCard, output: &Path) -> Result<()> {
    backend.write_png(&plan_share_png(card, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{FAKE_PNG, MockBackend, RecordedOp};
    use crate::types::Palette;

    fn palette() -> Palette {
        Palette {
            background: "#000000".into(),
            primary: "#ff0000".into(),
            secondary: "#00ff00".into(),
            accent: "#0000ff".into(),
            text: "#ffffff".into(),
        }
    }

    fn card<'a>(palette: &'a Palette, score: Option<&'a str>) -> ShareCard<'a> {
        ShareCard {
            score,
            game_name: "ORBIT",
            tagline: "Round and round.",
            colors: palette,
            decorations: &[],
            branding: "PIXELPIT ARCADE",
            font_family: "monospace",
        }
    }

    #[test]
    fn plan_uses_share_card_size() {
        let p = palette();
        let params = plan_share_png(&card(&p, Some("9")), Path::new("/out/x.png"));
        assert_eq!(params.size, Dimensions::SHARE_CARD);
        assert_eq!(params.output, Path::new("/out/x.png"));
        assert!(params.svg.contains(">9</text>"));
    }

    #[test]
    fn render_passes_template_svg_to_backend() {
        let p = palette();
        let backend = MockBackend::new();
        let bytes = render_share_png(&backend, &card(&p, Some("321"))).unwrap();
        assert_eq!(bytes, FAKE_PNG);

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Render { width: 1200, height: 630, svg } if svg.contains(">321</text>")
        ));
    }

    #[test]
    fn write_creates_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let p = palette();
        let backend = MockBackend::new();
        let output = tmp.path().join("orbit").join(IMAGE_FILENAME);
        write_share_png(&backend, &card(&p, None), &output).unwrap();
        assert!(output.exists());
    }
}
