//! Render cache for incremental builds.
//!
//! Rasterizing a 1200×630 card is the slow part of the pipeline, and a build
//! renders one card per game plus one per sample score. This module lets the
//! render stage skip rasterization when neither the SVG nor the raster
//! settings changed since the last build.
//!
//! ## Cache keys
//!
//! Lookups are content-addressed by `svg_hash` + `raster_hash`, not by output
//! path. Renaming a game's slug therefore reuses the old PNG (the slug is not
//! part of the image) and only palette, text, or decoration edits force a
//! re-render.
//!
//! - **`svg_hash`**: SHA-256 of the rendered SVG document. Anything that
//!   changes what the card looks like changes the SVG.
//! - **`raster_hash`**: SHA-256 of the pixel size and the font directories.
//!   Installing fonts into a new directory is a visible change the SVG can't
//!   see.
//!
//! A hit requires a matching entry **and** the recorded PNG still on disk.
//! When the content matches but the output path moved, the stored file is
//! copied instead of re-rendered.
//!
//! ## Storage
//!
//! `<output_dir>/.render-cache.json`, next to the PNGs it describes.
//! `--no-cache` loads an empty manifest so every card is re-rendered.

use crate::imaging::Dimensions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

const MANIFEST_FILENAME: &str = ".render-cache.json";

/// Bump to invalidate every existing cache when the key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub svg_hash: String,
    pub raster_hash: String,
}

impl CacheEntry {
    fn content_key(&self) -> String {
        content_key(&self.svg_hash, &self.raster_hash)
    }
}

fn content_key(svg_hash: &str, raster_hash: &str) -> String {
    format!("{svg_hash}:{raster_hash}")
}

/// Output path (relative to the output dir) → the content it was rendered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{svg_hash}:{raster_hash}"` → output path. Rebuilt on load.
    #[serde(skip)]
    by_content: HashMap<String, String>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Load from the output directory. A missing, corrupt or outdated
    /// manifest yields an empty one.
    pub fn load(output_dir: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(manifest_path(output_dir)) else {
            return Self::empty();
        };
        let Ok(mut manifest) = serde_json::from_str::<Self>(&content) else {
            return Self::empty();
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.by_content = manifest
            .entries
            .iter()
            .map(|(path, entry)| (entry.content_key(), path.clone()))
            .collect();
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(output_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Stored output path for this content, if the file still exists.
    ///
    /// The path may differ from the caller's target (slug rename); copying
    /// it over is the caller's job.
    pub fn find_cached(&self, svg_hash: &str, raster_hash: &str, output_dir: &Path) -> Option<String> {
        let stored = self.by_content.get(&content_key(svg_hash, raster_hash))?;
        output_dir.join(stored).exists().then(|| stored.clone())
    }

    /// Record that `output_path` holds this content. An older entry for the
    /// same content under another path is dropped.
    pub fn insert(&mut self, output_path: String, svg_hash: String, raster_hash: String) {
        let key = content_key(&svg_hash, &raster_hash);
        if let Some(old) = self.by_content.get(&key)
            && *old != output_path
        {
            self.entries.remove(old.as_str());
        }
        self.by_content.insert(key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                svg_hash,
                raster_hash,
            },
        );
    }
}

pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

/// SHA-256 of an SVG document, hex encoded.
pub fn hash_svg(svg: &str) -> String {
    format!("{:x}", Sha256::digest(svg.as_bytes()))
}

/// SHA-256 of the raster settings that shape the pixels but not the SVG.
pub fn hash_raster_params(size: Dimensions, font_dirs: &[PathBuf]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"png\0");
    hasher.update(size.width.to_le_bytes());
    hasher.update(size.height.to_le_bytes());
    for dir in font_dirs {
        hasher.update(dir.to_string_lossy().as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a render run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hits, self.copies) {
            (0, 0) => write!(f, "{} rendered", self.misses),
            (hits, 0) => write!(
                f,
                "{} cached, {} rendered ({} total)",
                hits,
                self.misses,
                self.total()
            ),
            (hits, copies) => write!(
                f,
                "{} cached, {} copied, {} rendered ({} total)",
                hits,
                copies,
                self.misses,
                self.total()
            ),
        }
    }
}
