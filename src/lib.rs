//! # Pixelpit Press
//!
//! Marketing and social-sharing surfaces for the Pixelpit arcade: per-game
//! Open Graph share images, "lab" pages showing build transcripts, share
//! links that forward players to the live game, and a redirect layer for
//! legacy share URLs.
//!
//! Game identity is data, not code. Each game is one TOML file holding its
//! name, tagline, palette and decoration layer; every share image is drawn
//! from the same template ([`share_image`]) parameterized by that data and
//! a score string.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! The static build runs three independent stages:
//!
//! ```text
//! 1. Scan      content/  →  catalog.json   (TOML files → validated catalog)
//! 2. Render    catalog   →  rendered/      (share PNGs, content-addressed cache)
//! 3. Generate  catalog   →  dist/          (share/lab pages, _redirects, metadata)
//! ```
//!
//! A static host can only serve the scores that were pre-rendered, so the
//! [`server`] module answers the same routes on demand for any score,
//! rendering from the in-memory catalog.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Stage 1: reads and validates `games/` and `labs/` into a [`catalog::Catalog`] |
//! | [`render`] | Stage 2: rasterizes game cards and sample-score images in parallel |
//! | [`generate`] | Stage 3: writes HTML pages, `_redirects` and `metadata.json` using Maud |
//! | [`server`] | Axum server for share pages and images at any score |
//! | [`share_image`] | The 1200×630 share-image template, as SVG |
//! | [`imaging`] | SVG → PNG rasterization behind the [`imaging::Rasterizer`] trait |
//! | [`metadata`] | Page titles, descriptions and Open Graph / Twitter descriptors |
//! | [`routes`] | Public URL layout, share forwarding and redirect rules |
//! | [`transcript`] | Inline emphasis for lab transcript messages |
//! | [`cache`] | Render cache manifest keyed by SVG and raster-parameter hashes |
//! | [`config`] | `config.toml` loading, stock defaults and validation |
//! | [`types`] | Game descriptors, palettes, decorations and lab transcripts |
//! | [`naming`] | `NNN-slug` file-name convention |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## One Template, Data Per Game
//!
//! Every game shares the layout of [`share_image::ShareCard`]: background,
//! corner accents in the accent colour, score, name, tagline and footer.
//! What differs per game is only its palette and a list of decoration shapes,
//! so adding a game is adding a TOML file.
//!
//! ## SVG Through Maud, Rasterized With resvg
//!
//! The template is an SVG document built with [Maud](https://maud.lambda.xyz/),
//! which escapes every interpolated score and name. [resvg] turns it into
//! pixels without a browser or system libraries, and the `image` crate
//! encodes the PNG.
//!
//! ## Scores Are Opaque
//!
//! A score is a path segment, never parsed. `"1234"` is drawn as `1234`, a
//! blank score degrades the page metadata to the game card, and anything the
//! leaderboard puts in a URL ends up on the image verbatim.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod generate;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod render;
pub mod routes;
pub mod server;
pub mod share_image;
pub mod transcript;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
