//! Shared types used across all pipeline stages.
//!
//! These types are deserialized from the content directory during scan,
//! serialized into `catalog.json`, and read back by the render and generate
//! stages and by the server.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A game's colour identity.
///
/// Share images follow a primary / secondary / accent convention: the score
/// is drawn in `primary`, the tagline in `secondary`, and the corner
/// accents in `accent`. `background` fills the canvas and `text` is used for
/// the game name and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Palette {
    pub background: String,
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub text: String,
}

impl Palette {
    /// The ordered colour set: primary, secondary, accent.
    pub fn ordered(&self) -> [&str; 3] {
        [&self.primary, &self.secondary, &self.accent]
    }

    /// Resolve a colour reference against this palette.
    ///
    /// A reference is either a role name (`"primary"`, `"accent"`, ...) or a
    /// literal hex colour. Returns `None` for unknown roles and malformed hex.
    pub fn resolve<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        match reference {
            "background" => Some(&self.background),
            "primary" => Some(&self.primary),
            "secondary" => Some(&self.secondary),
            "accent" => Some(&self.accent),
            "text" => Some(&self.text),
            hex if is_hex_color(hex) => Some(hex),
            _ => None,
        }
    }

    /// All colours that fail [`is_hex_color`], paired with their role.
    pub fn invalid_colors(&self) -> Vec<(&'static str, &str)> {
        [
            ("background", self.background.as_str()),
            ("primary", self.primary.as_str()),
            ("secondary", self.secondary.as_str()),
            ("accent", self.accent.as_str()),
            ("text", self.text.as_str()),
        ]
        .into_iter()
        .filter(|(_, c)| !is_hex_color(c))
        .collect()
    }
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Parse a hex colour into RGBA bytes. Short form is expanded (`#f80` → `#ff8800`).
pub fn parse_hex_color(value: &str) -> Option<[u8; 4]> {
    if !is_hex_color(value) {
        return None;
    }
    let hex = &value[1..];
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };
    let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    let alpha = if expanded.len() == 8 { byte(6)? } else { 255 };
    Some([byte(0)?, byte(2)?, byte(4)?, alpha])
}

fn default_opacity() -> f32 {
    1.0
}

/// One decorative shape drawn behind the text of a game's share image.
///
/// Coordinates are in the 1200×630 canvas space. `fill` / `stroke` are
/// colour references resolved through [`Palette::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decoration {
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: String,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default)]
        rx: f32,
        fill: String,
        #[serde(default = "default_opacity")]
        opacity: f32,
        /// Rotation in degrees around the rectangle's centre.
        #[serde(default)]
        rotate: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
    Polygon {
        points: Vec<[f32; 2]>,
        fill: String,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
    /// A short run of text (usually one character) used as a sprite.
    Glyph {
        x: f32,
        y: f32,
        size: f32,
        text: String,
        fill: String,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
}

fn default_stroke_width() -> f32 {
    4.0
}

impl Decoration {
    /// The colour reference this shape paints with.
    pub fn color_ref(&self) -> &str {
        match self {
            Decoration::Circle { fill, .. }
            | Decoration::Rect { fill, .. }
            | Decoration::Polygon { fill, .. }
            | Decoration::Glyph { fill, .. } => fill,
            Decoration::Line { stroke, .. } => stroke,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Decoration::Circle { .. } => "circle",
            Decoration::Rect { .. } => "rect",
            Decoration::Line { .. } => "line",
            Decoration::Polygon { .. } => "polygon",
            Decoration::Glyph { .. } => "glyph",
        }
    }
}

/// Fixed identity of one arcade game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDescriptor {
    /// Route slug, from the file name with the number prefix stripped.
    pub slug: String,
    /// Sort key from the number prefix (`u32::MAX` when unlisted).
    pub sort_key: u32,
    /// Whether the game appears on the arcade and labs indexes.
    pub listed: bool,
    pub name: String,
    pub tagline: String,
    /// Longer blurb for page metadata; falls back to the tagline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub colors: Palette,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<Decoration>,
}

impl GameDescriptor {
    pub fn blurb(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.tagline)
    }
}

/// A participant in a lab transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Speaker {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Colour reference for the speaker's name, resolved against the game palette.
    #[serde(default = "default_speaker_color")]
    pub color: String,
}

fn default_speaker_color() -> String {
    "text".to_string()
}

/// One message in a lab transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptEntry {
    /// Key into [`Lab::speakers`].
    pub speaker: String,
    /// Free-form timestamp label, displayed verbatim.
    pub time: String,
    /// Message text with `**strong**`, `*em*` and `` `code` `` markers.
    pub body: String,
}

/// A lab page: the build transcript of one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lab {
    /// Slug of the game this transcript belongs to.
    pub slug: String,
    pub title: String,
    /// Markdown introduction shown above the transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub speakers: BTreeMap<String, Speaker>,
    pub entries: Vec<TranscriptEntry>,
}
