//! Content scanning and catalog construction.
//!
//! Stage 1 of the pipeline. Reads the content directory into a [`Catalog`]
//! that the render and generate stages (and the server) consume.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── config.toml              # Site configuration (optional)
//! ├── assets/                  # Copied verbatim to the output root
//! ├── games/
//! │   ├── 010-beam.toml        # Listed game (numbered)
//! │   ├── 020-sprout-run.toml
//! │   └── proto-snake.toml     # Unlisted game: rendered, routable, not indexed
//! └── labs/
//!     ├── beam.toml            # Build transcript for the `beam` game
//!     └── sprout-run.toml
//! ```
//!
//! ## Game file
//!
//! ```toml
//! name = "BEAM"
//! tagline = "Dodge the light. Chase the glow."
//! description = "Optional longer blurb for page metadata."
//!
//! [colors]
//! background = "#0b1026"
//! primary = "#22d3ee"
//! secondary = "#a78bfa"
//! accent = "#facc15"
//! text = "#f8fafc"
//!
//! [[decorations]]
//! kind = "circle"       # circle | rect | line | polygon | glyph
//! cx = 140
//! cy = 150
//! r = 60
//! fill = "secondary"    # palette role or literal hex
//! opacity = 0.35
//! ```
//!
//! ## Validation
//!
//! The scanner rejects content the renderer could only draw wrongly:
//! malformed colours, decoration or speaker colour references that resolve
//! to nothing, duplicate slugs or index numbers, labs without a game, and
//! transcript entries naming an undeclared speaker.

use crate::config::{self, SiteConfig};
use crate::naming::{is_valid_slug, parse_entry_name};
use crate::types::{Decoration, GameDescriptor, Lab, Palette, Speaker, TranscriptEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("TOML error in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid slug '{slug}' from {path} (use lowercase letters, digits and single dashes)")]
    InvalidSlug { slug: String, path: PathBuf },
    #[error("Duplicate game slug '{0}'")]
    DuplicateSlug(String),
    #[error("Duplicate game number {0} ({1} and {2})")]
    DuplicateNumber(u32, String, String),
    #[error("Game '{game}': {role} colour '{value}' is not a hex colour")]
    InvalidColor {
        game: String,
        role: String,
        value: String,
    },
    #[error("Game '{game}': {kind} decoration #{index} uses unknown colour '{reference}'")]
    UnknownColorRef {
        game: String,
        kind: String,
        index: usize,
        reference: String,
    },
    #[error("Lab '{0}' has no matching game")]
    OrphanLab(String),
    #[error("Lab '{lab}': speaker '{speaker}' uses unknown colour '{reference}'")]
    UnknownSpeakerColor {
        lab: String,
        speaker: String,
        reference: String,
    },
    #[error("Lab '{lab}': entry #{index} names undeclared speaker '{speaker}'")]
    UnknownSpeaker {
        lab: String,
        index: usize,
        speaker: String,
    },
}

/// Everything the later stages need, read once from the content directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Listed games in index order, then unlisted games by slug.
    pub games: Vec<GameDescriptor>,
    /// Lab transcripts keyed by game slug.
    pub labs: BTreeMap<String, Lab>,
    pub config: SiteConfig,
}

impl Catalog {
    pub fn game(&self, slug: &str) -> Option<&GameDescriptor> {
        self.games.iter().find(|g| g.slug == slug)
    }

    pub fn lab(&self, slug: &str) -> Option<&Lab> {
        self.labs.get(slug)
    }

    pub fn listed_games(&self) -> impl Iterator<Item = &GameDescriptor> {
        self.games.iter().filter(|g| g.listed)
    }

    /// Load a catalog previously written by the scan stage.
    pub fn load(path: &Path) -> Result<Catalog, CatalogFileError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the catalog as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), CatalogFileError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CatalogFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk shape of `games/*.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GameFile {
    name: String,
    tagline: String,
    #[serde(default)]
    description: Option<String>,
    colors: Palette,
    #[serde(default)]
    decorations: Vec<Decoration>,
}

/// On-disk shape of `labs/*.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LabFile {
    title: String,
    #[serde(default)]
    intro: Option<String>,
    speakers: BTreeMap<String, Speaker>,
    #[serde(default)]
    entries: Vec<TranscriptEntry>,
}

pub fn scan(root: &Path) -> Result<Catalog, ScanError> {
    let config = config::load_config(root)?;
    let games = scan_games(&root.join("games"))?;
    let labs = scan_labs(&root.join("labs"))?;

    for lab in labs.values() {
        let game = games
            .iter()
            .find(|g| g.slug == lab.slug)
            .ok_or_else(|| ScanError::OrphanLab(lab.slug.clone()))?;
        validate_speakers(lab, &game.colors)?;
    }

    Ok(Catalog {
        games,
        labs,
        config,
    })
}

/// `.toml` files directly inside `dir`, sorted by name. Missing dir → empty.
fn toml_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("toml"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ScanError> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| ScanError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn scan_games(dir: &Path) -> Result<Vec<GameDescriptor>, ScanError> {
    let mut games: Vec<GameDescriptor> = Vec::new();
    let mut numbers: HashMap<u32, String> = HashMap::new();

    for path in toml_files(dir)? {
        let parsed = parse_entry_name(&file_stem(&path));
        if !is_valid_slug(&parsed.slug) {
            return Err(ScanError::InvalidSlug {
                slug: parsed.slug,
                path,
            });
        }
        if games.iter().any(|g| g.slug == parsed.slug) {
            return Err(ScanError::DuplicateSlug(parsed.slug));
        }
        if let Some(number) = parsed.number
            && let Some(other) = numbers.insert(number, parsed.slug.clone())
        {
            return Err(ScanError::DuplicateNumber(number, other, parsed.slug));
        }

        let file: GameFile = read_toml(&path)?;
        validate_palette(&parsed.slug, &file.colors, &file.decorations)?;

        games.push(GameDescriptor {
            slug: parsed.slug,
            sort_key: parsed.number.unwrap_or(u32::MAX),
            listed: parsed.number.is_some(),
            name: file.name,
            tagline: file.tagline,
            description: file.description,
            colors: file.colors,
            decorations: file.decorations,
        });
    }

    games.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.slug.cmp(&b.slug)));
    Ok(games)
}

fn validate_palette(
    slug: &str,
    palette: &Palette,
    decorations: &[Decoration],
) -> Result<(), ScanError> {
    if let Some((role, value)) = palette.invalid_colors().into_iter().next() {
        return Err(ScanError::InvalidColor {
            game: slug.to_string(),
            role: role.to_string(),
            value: value.to_string(),
        });
    }
    for (index, decoration) in decorations.iter().enumerate() {
        if palette.resolve(decoration.color_ref()).is_none() {
            return Err(ScanError::UnknownColorRef {
                game: slug.to_string(),
                kind: decoration.kind().to_string(),
                index: index + 1,
                reference: decoration.color_ref().to_string(),
            });
        }
    }
    Ok(())
}

fn validate_speakers(lab: &Lab, palette: &Palette) -> Result<(), ScanError> {
    for (id, speaker) in &lab.speakers {
        if palette.resolve(&speaker.color).is_none() {
            return Err(ScanError::UnknownSpeakerColor {
                lab: lab.slug.clone(),
                speaker: id.clone(),
                reference: speaker.color.clone(),
            });
        }
    }
    Ok(())
}

fn scan_labs(dir: &Path) -> Result<BTreeMap<String, Lab>, ScanError> {
    let mut labs = BTreeMap::new();
    for path in toml_files(dir)? {
        let slug = file_stem(&path);
        if !is_valid_slug(&slug) {
            return Err(ScanError::InvalidSlug { slug, path });
        }
        let file: LabFile = read_toml(&path)?;
        for (index, entry) in file.entries.iter().enumerate() {
            if !file.speakers.contains_key(&entry.speaker) {
                return Err(ScanError::UnknownSpeaker {
                    lab: slug.clone(),
                    index: index + 1,
                    speaker: entry.speaker.clone(),
                });
            }
        }
        labs.insert(
            slug.clone(),
            Lab {
                slug,
                title: file.title,
                intro: file.intro,
                speakers: file.speakers,
                entries: file.entries,
            },
        );
    }
    Ok(labs)
}
