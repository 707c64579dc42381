//! Page metadata for share, game and lab pages.
//!
//! Every public page carries a [`PageMeta`]: the document title and
//! description plus the Open Graph and Twitter card descriptors that social
//! platforms read when a link is pasted.
//!
//! ## Score interpolation
//!
//! Share pages interpolate the score into their strings verbatim:
//!
//! ```text
//! score "1234"  →  title        "I scored 1234 on BEAM"
//!                  description  "Think you can beat 1234? Dodge the light."
//!                  og:image     <arcade>/beam/share/1234/opengraph-image
//! no score      →  title        "BEAM | Pixelpit Arcade"
//!                  description  "Dodge the light."
//!                  og:image     <arcade>/beam/opengraph-image
//! ```
//!
//! A blank score counts as missing. Nothing is validated: the score is a
//! token from a URL, not a number.

use crate::config::SiteSection;
use crate::imaging::Dimensions;
use crate::routes::{Routes, present};
use crate::types::{GameDescriptor, Lab};
use maud::{Markup, html};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub url: String,
    pub site_name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub images: Vec<OgImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OgImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwitterCard {
    pub card: &'static str,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
}

/// First non-empty value among `sources`, in priority order.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(String::from)
}

impl PageMeta {
    fn new(site: &SiteSection, title: String, description: String, url: Url, image: OgImage) -> Self {
        Self {
            open_graph: OpenGraph {
                title: title.clone(),
                description: description.clone(),
                url: url.to_string(),
                site_name: site.name.clone(),
                kind: "website",
                images: vec![image.clone()],
            },
            twitter: TwitterCard {
                card: "summary_large_image",
                title: title.clone(),
                description: description.clone(),
                images: vec![image.url],
            },
            title,
            description,
            canonical_url: url.to_string(),
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        self.open_graph.images.first().map(|i| i.url.as_str())
    }

    /// `<head>` tags for this page.
    pub fn head_tags(&self) -> Markup {
        let og = &self.open_graph;
        html! {
            title { (self.title) }
            meta name="description" content=(self.description);
            link rel="canonical" href=(self.canonical_url);
            meta property="og:type" content=(og.kind);
            meta property="og:site_name" content=(og.site_name);
            meta property="og:title" content=(og.title);
            meta property="og:description" content=(og.description);
            meta property="og:url" content=(og.url);
            @for image in &og.images {
                meta property="og:image" content=(image.url);
                meta property="og:image:width" content=(image.width);
                meta property="og:image:height" content=(image.height);
                meta property="og:image:alt" content=(image.alt);
            }
            meta name="twitter:card" content=(self.twitter.card);
            meta name="twitter:title" content=(self.twitter.title);
            meta name="twitter:description" content=(self.twitter.description);
            @for image in &self.twitter.images {
                meta name="twitter:image" content=(image);
            }
        }
    }
}

fn card_image(url: Url, alt: String) -> OgImage {
    OgImage {
        url: url.to_string(),
        width: Dimensions::SHARE_CARD.width,
        height: Dimensions::SHARE_CARD.height,
        alt,
    }
}

fn game_description(game: &GameDescriptor) -> String {
    resolve(&[game.description.as_deref(), Some(game.tagline.as_str())]).unwrap_or_default()
}

/// Metadata for the live game route.
pub fn game_page_meta(routes: &Routes, site: &SiteSection, game: &GameDescriptor) -> PageMeta {
    PageMeta::new(
        site,
        format!("{} | {}", game.name, site.name),
        game_description(game),
        routes.game(&game.slug),
        card_image(routes.card_image(&game.slug), format!("{}: {}", game.name, game.tagline)),
    )
}

/// Metadata for a share page; see the [module docs](self) for the strings.
pub fn share_page_meta(
    routes: &Routes,
    site: &SiteSection,
    game: &GameDescriptor,
    score: Option<&str>,
) -> PageMeta {
    let url = routes.share(&game.slug, score);
    let image = routes.share_image(&game.slug, score);
    match present(score) {
        Some(score) => PageMeta::new(
            site,
            format!("I scored {} on {}", score, game.name),
            format!("Think you can beat {}? {}", score, game.tagline),
            url,
            card_image(image, format!("{} score: {}", game.name, score)),
        ),
        None => PageMeta::new(
            site,
            format!("{} | {}", game.name, site.name),
            game_description(game),
            url,
            card_image(image, format!("{}: {}", game.name, game.tagline)),
        ),
    }
}

/// Metadata for a lab page.
pub fn lab_page_meta(routes: &Routes, site: &SiteSection, game: &GameDescriptor, lab: &Lab) -> PageMeta {
    let description = resolve(&[lab.intro.as_deref().map(first_paragraph), Some(game.tagline.as_str())])
        .unwrap_or_default();
    PageMeta::new(
        site,
        format!("{} | {} Lab", lab.title, site.name),
        description,
        routes.lab(&game.slug),
        card_image(routes.card_image(&game.slug), format!("{}: {}", game.name, game.tagline)),
    )
}

/// Metadata for the labs index, using `lead`'s card as the image.
pub fn labs_index_meta(routes: &Routes, site: &SiteSection, lead: &GameDescriptor) -> PageMeta {
    let image = card_image(routes.card_image(&lead.slug), lead.name.clone());
    PageMeta::new(
        site,
        format!("Labs | {}", site.name),
        format!("How the {} games were built, one conversation at a time.", site.name),
        routes.labs_index(),
        image,
    )
}

/// Plain first paragraph of a markdown intro, for descriptions.
fn first_paragraph(markdown: &str) -> &str {
    markdown.trim().split("\n\n").next().unwrap_or_default()
}
