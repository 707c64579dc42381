//! The shared share-image template.
//!
//! Every game's preview image is the same 1200×630 composition, parameterized
//! by the game's palette, its decoration layer, and (for share images) the
//! score string:
//!
//! ```text
//! ┌┐                                          ┌┐   corner accents (accent colour)
//!            ○    decorations    ◇
//!                   I SCORED
//!                     1234                         score (primary, large)
//!                     BEAM                         game name (text, medium)
//!           Dodge the light. Chase the glow.       tagline (secondary, small)
//!
//!               PIXELPIT ARCADE                    branding footer
//! └┘                                          └┘
//! ```
//!
//! Without a score the template renders the game card instead: the game name
//! takes the large slot and there is no "I SCORED" label.
//!
//! The template produces an SVG document through Maud. Layers are emitted in
//! a fixed order so the accents always sit above the decorations and the
//! text above both. All text is interpolated verbatim: `"1234"` is drawn as
//! `1234`, never `1,234`. Characters XML 1.0 cannot carry are drawn as
//! U+FFFD, so any string still yields a parseable document.

use crate::config::SiteConfig;
use crate::types::{Decoration, GameDescriptor, Palette};
use maud::{Markup, html};
use std::borrow::Cow;

/// Share-image width in pixels (Open Graph convention).
pub const WIDTH: u32 = 1200;
/// Share-image height in pixels.
pub const HEIGHT: u32 = 630;

/// Distance of each corner accent from the canvas edges.
pub const ACCENT_INSET: f32 = 28.0;
/// Length of each accent arm.
pub const ACCENT_LENGTH: f32 = 120.0;
/// Thickness of each accent arm.
pub const ACCENT_THICKNESS: f32 = 12.0;

const CENTER_X: f32 = WIDTH as f32 / 2.0;
const FOOTER_Y: f32 = 586.0;

/// Inputs of the share-image template.
#[derive(Debug, Clone, Copy)]
pub struct ShareCard<'a> {
    /// Score text; `None` renders the game card.
    pub score: Option<&'a str>,
    pub game_name: &'a str,
    pub tagline: &'a str,
    pub colors: &'a Palette,
    pub decorations: &'a [Decoration],
    pub branding: &'a str,
    pub font_family: &'a str,
}

impl<'a> ShareCard<'a> {
    pub fn for_game(game: &'a GameDescriptor, score: Option<&'a str>, config: &'a SiteConfig) -> Self {
        Self {
            score,
            game_name: &game.name,
            tagline: &game.tagline,
            colors: &game.colors,
            decorations: &game.decorations,
            branding: &config.site.branding,
            font_family: &config.images.font_family,
        }
    }

    /// Render the composition as an SVG document.
    pub fn to_svg(&self) -> Markup {
        let c = self.colors;
        let game_name = xml_text(self.game_name);
        let tagline = xml_text(self.tagline);
        let branding = xml_text(self.branding);
        html! {
            svg xmlns="http://www.w3.org/2000/svg"
                width=(WIDTH) height=(HEIGHT)
                viewBox={ "0 0 " (WIDTH) " " (HEIGHT) } {
                rect x="0" y="0" width=(WIDTH) height=(HEIGHT) fill=(c.background) {}
                g class="decorations" {
                    @for decoration in self.decorations {
                        (render_decoration(decoration, c))
                    }
                }
                (corner_accents(&c.accent))
                g class="text" font-family=(self.font_family) text-anchor="middle" {
                    @match self.score {
                        Some(score) => {
                            text x=(CENTER_X) y="150" font-size="28" letter-spacing="8"
                                fill=(c.text) fill-opacity="0.8" { "I SCORED" }
                            text class="score" x=(CENTER_X) y="318" font-size="168" font-weight="700"
                                fill=(c.primary) { (xml_text(score)) }
                            text class="name" x=(CENTER_X) y="404" font-size="56" font-weight="700"
                                fill=(c.text) { (game_name) }
                            text class="tagline" x=(CENTER_X) y="458" font-size="30"
                                fill=(c.secondary) { (tagline) }
                        }
                        None => {
                            text class="name" x=(CENTER_X) y="300" font-size="112" font-weight="700"
                                fill=(c.primary) { (game_name) }
                            text class="tagline" x=(CENTER_X) y="380" font-size="36"
                                fill=(c.secondary) { (tagline) }
                        }
                    }
                    text class="footer" x=(CENTER_X) y=(FOOTER_Y) font-size="24" letter-spacing="6"
                        fill=(c.text) fill-opacity="0.75" { (branding) }
                }
            }
        }
    }

    pub fn to_svg_string(&self) -> String {
        self.to_svg().into_string()
    }
}

/// Replaces characters outside the XML 1.0 `Char` production with U+FFFD.
pub fn xml_text(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .map(|ch| if is_xml_char(ch) { ch } else { char::REPLACEMENT_CHARACTER })
            .collect(),
    )
}

fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Two arms per corner, drawn in the accent colour.
fn corner_accents(accent: &str) -> Markup {
    let far_x = WIDTH as f32 - ACCENT_INSET;
    let far_y = HEIGHT as f32 - ACCENT_INSET;
    let corners = [
        (ACCENT_INSET, ACCENT_INSET, 1.0, 1.0),
        (far_x, ACCENT_INSET, -1.0, 1.0),
        (ACCENT_INSET, far_y, 1.0, -1.0),
        (far_x, far_y, -1.0, -1.0),
    ];
    html! {
        g class="accents" fill=(accent) {
            @for (x, y, dx, dy) in corners {
                // arms grow inward from the corner point
                @let left = if dx > 0.0 { x } else { x - ACCENT_LENGTH };
                @let top = if dy > 0.0 { y } else { y - ACCENT_THICKNESS };
                rect x=(left) y=(top) width=(ACCENT_LENGTH) height=(ACCENT_THICKNESS) {}
                @let left = if dx > 0.0 { x } else { x - ACCENT_THICKNESS };
                @let top = if dy > 0.0 { y } else { y - ACCENT_LENGTH };
                rect x=(left) y=(top) width=(ACCENT_THICKNESS) height=(ACCENT_LENGTH) {}
            }
        }
    }
}

fn render_decoration(decoration: &Decoration, palette: &Palette) -> Markup {
    let color = palette
        .resolve(decoration.color_ref())
        .unwrap_or(palette.text.as_str());
    match decoration {
        Decoration::Circle {
            cx, cy, r, opacity, ..
        } => html! {
            circle cx=(cx) cy=(cy) r=(r) fill=(color) fill-opacity=(opacity) {}
        },
        Decoration::Rect {
            x,
            y,
            width,
            height,
            rx,
            opacity,
            rotate,
            ..
        } => {
            let transform = (*rotate != 0.0)
                .then(|| format!("rotate({} {} {})", rotate, x + width / 2.0, y + height / 2.0));
            html! {
                rect x=(x) y=(y) width=(width) height=(height) rx=(rx)
                    fill=(color) fill-opacity=(opacity) transform=[transform] {}
            }
        }
        Decoration::Line {
            x1,
            y1,
            x2,
            y2,
            stroke_width,
            opacity,
            ..
        } => html! {
            line x1=(x1) y1=(y1) x2=(x2) y2=(y2) stroke=(color)
                stroke-width=(stroke_width) stroke-opacity=(opacity) stroke-linecap="round" {}
        },
        Decoration::Polygon {
            points, opacity, ..
        } => {
            let points = points
                .iter()
                .map(|[x, y]| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" ");
            html! {
                polygon points=(points) fill=(color) fill-opacity=(opacity) {}
            }
        }
        Decoration::Glyph {
            x,
            y,
            size,
            text,
            opacity,
            ..
        } => html! {
            text x=(x) y=(y) font-size=(size) fill=(color) fill-opacity=(opacity) { (xml_text(text)) }
        },
    }
}
