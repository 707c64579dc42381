//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's `content/config.toml` is merged
//! on top of it, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! name = "Pixelpit Arcade"
//! base_url = "https://pixelpit.gg"
//! arcade_path = "/pixelpit/arcade"   # Route prefix of every game
//! branding = "PIXELPIT ARCADE"       # Footer text on share images
//!
//! [images]
//! font_family = "monospace"          # Font for all text on share images
//! font_dirs = []                     # Extra directories scanned for fonts
//! sample_scores = []                 # Scores pre-rendered by the static build
//!
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [processing]
//! max_processes = 4                  # Max parallel render workers (omit for auto)
//!
//! [[redirects]]
//! from = "/pp/:path*"
//! to = "/pixelpit/arcade/:path*"
//! permanent = true
//! ```
//!
//! Unknown keys are rejected to catch typos early. `redirects` is an array,
//! so a user file that declares any redirect replaces the stock list.

use crate::routes::RedirectRule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity and URL layout.
    pub site: SiteSection,
    /// Share-image rendering settings.
    pub images: ImagesConfig,
    /// HTTP server settings for `serve`.
    pub server: ServerConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
    /// Static redirect table, applied in order.
    pub redirects: Vec<RedirectRule>,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.site.base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "site.base_url '{}' is not a URL: {e}",
                self.site.base_url
            ))
        })?;
        let arcade = &self.site.arcade_path;
        if !arcade.starts_with('/') || arcade.len() < 2 || arcade.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "site.arcade_path must start with '/' and not end with '/', got '{arcade}'"
            )));
        }
        if self.images.font_family.trim().is_empty() {
            return Err(ConfigError::Validation(
                "images.font_family must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for score in &self.images.sample_scores {
            if !is_path_segment(score) {
                return Err(ConfigError::Validation(format!(
                    "images.sample_scores entry '{score}' must be a non-blank path segment"
                )));
            }
            if !seen.insert(score.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "images.sample_scores lists '{score}' more than once"
                )));
            }
        }
        for rule in &self.redirects {
            rule.validate().map_err(ConfigError::Validation)?;
        }
        Ok(())
    }

    /// Font directories resolved against the content root.
    pub fn font_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.images.font_dirs.iter().map(|d| root.join(d)).collect()
    }
}

/// A score that can be written as one directory name.
fn is_path_segment(score: &str) -> bool {
    !score.trim().is_empty()
        && score != "."
        && score != ".."
        && !score.contains(['/', '\\'])
}

/// Site identity and URL layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Human-readable site name, used in titles and `og:site_name`.
    pub name: String,
    /// Absolute origin used for canonical and social-card URLs.
    pub base_url: String,
    /// Route prefix under which every game lives.
    pub arcade_path: String,
    /// Text in the share-image footer.
    pub branding: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            name: "Pixelpit Arcade".to_string(),
            base_url: "https://pixelpit.gg".to_string(),
            arcade_path: "/pixelpit/arcade".to_string(),
            branding: "PIXELPIT ARCADE".to_string(),
        }
    }
}

/// Share-image rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Font family for every text element on share images.
    pub font_family: String,
    /// Extra font directories, relative to the content root.
    pub font_dirs: Vec<PathBuf>,
    /// Scores for which the static build pre-renders share images.
    pub sample_scores: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_dirs: Vec::new(),
            sample_scores: Vec::new(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the server listens on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// The stock redirect table: legacy `/pp/...` share links.
pub fn default_redirects() -> Vec<RedirectRule> {
    vec![RedirectRule {
        from: "/pp/:path*".to_string(),
        to: "/pixelpit/arcade/:path*".to_string(),
        permanent: true,
    }]
}

impl SiteConfig {
    /// Stock configuration, including the stock redirect table.
    pub fn stock() -> Self {
        Self {
            redirects: default_redirects(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::stock())
        .map_err(|e| ConfigError::Validation(format!("stock config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pixelpit Press Configuration
# ============================
# All settings are optional. Values shown below are the defaults.
# Place this file at content/config.toml. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Site identity and URL layout
# ---------------------------------------------------------------------------
[site]
# Used in page titles and og:site_name.
name = "Pixelpit Arcade"

# Absolute origin for canonical and social-card URLs.
base_url = "https://pixelpit.gg"

# Route prefix every game lives under: <arcade_path>/<game>.
arcade_path = "/pixelpit/arcade"

# Footer text drawn at the bottom of every share image.
branding = "PIXELPIT ARCADE"

# ---------------------------------------------------------------------------
# Share images (always 1200x630 PNG)
# ---------------------------------------------------------------------------
[images]
# Font family for score, name, tagline and footer.
font_family = "monospace"

# Extra font directories, relative to the content root.
font_dirs = []

# Scores the static build pre-renders as
# <arcade_path>/<game>/share/<score>/opengraph-image.png
sample_scores = []

# ---------------------------------------------------------------------------
# HTTP server (`pixelpit-press serve`)
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:3000"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Redirects
# ---------------------------------------------------------------------------
# ":name" captures one path segment, ":name*" captures the rest of the path.
# Declaring any [[redirects]] entry replaces this list.
[[redirects]]
from = "/pp/:path*"
to = "/pixelpit/arcade/:path*"
permanent = true
"##
}
