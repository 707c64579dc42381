//! Share-image rendering.
//!
//! Stage 2 of the build pipeline. Takes the catalog from the scan stage and
//! rasterizes every static share image: one game card per game, plus one
//! score image per configured sample score.
//!
//! ## Output Structure
//!
//! ```text
//! rendered/
//! ├── .render-cache.json
//! ├── beam/
//! │   ├── opengraph-image.png            # game card
//! │   └── share/
//! │       ├── 0/opengraph-image.png      # sample score "0"
//! │       └── 1234/opengraph-image.png
//! └── sprout-run/
//!     └── ...
//! ```
//!
//! The directory tree mirrors the public URL layout below the arcade path,
//! so the generate stage copies it into place unchanged.
//!
//! ## Parallel Rendering
//!
//! Cache lookups run up front; only misses are rasterized, in parallel on
//! the global [rayon](https://docs.rs/rayon) pool. Progress events are sent
//! over an optional channel as each image finishes.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::catalog::Catalog;
use crate::imaging::{
    BackendError, Dimensions, IMAGE_FILENAME, PngParams, Rasterizer, ResvgBackend,
    plan_share_png,
};
use crate::share_image::ShareCard;
use crate::types::GameDescriptor;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Rendering {path} failed: {source}")]
    Imaging {
        path: String,
        source: BackendError,
    },
}

/// How an image came to exist in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Unchanged since the last build.
    Cached,
    /// Same content existed under another path and was copied.
    Copied,
    /// Rasterized in this run.
    Rendered,
}

#[derive(Debug, Clone)]
pub enum RenderEvent {
    GameStarted {
        index: usize,
        name: String,
        image_count: usize,
    },
    ImageRendered {
        /// `"card"` or `"score 1234"`.
        label: String,
        path: String,
        status: RenderStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub slug: String,
    pub score: Option<String>,
    /// Path relative to the render output directory.
    pub path: String,
    pub status: RenderStatus,
}

#[derive(Debug)]
pub struct RenderResult {
    pub images: Vec<RenderedImage>,
    pub cache_stats: CacheStats,
}

/// Relative path of a share image: `<slug>/opengraph-image.png` for the
/// card, `<slug>/share/<score>/opengraph-image.png` for a score.
pub fn image_rel_path(slug: &str, score: Option<&str>) -> String {
    match score {
        Some(score) => format!("{slug}/share/{score}/{IMAGE_FILENAME}"),
        None => format!("{slug}/{IMAGE_FILENAME}"),
    }
}

struct Job<'a> {
    game: &'a GameDescriptor,
    score: Option<&'a str>,
    rel_path: String,
    params: PngParams,
    svg_hash: String,
}

impl Job<'_> {
    fn label(&self) -> String {
        match self.score {
            Some(score) => format!("score {score}"),
            None => "card".to_string(),
        }
    }

    fn finish(&self, status: RenderStatus) -> RenderedImage {
        RenderedImage {
            slug: self.game.slug.clone(),
            score: self.score.map(str::to_string),
            path: self.rel_path.clone(),
            status,
        }
    }
}

/// Render with the resvg backend, loading fonts from `font_dirs`.
pub fn render(
    catalog: &Catalog,
    output_dir: &Path,
    font_dirs: &[PathBuf],
    use_cache: bool,
    progress: Option<Sender<RenderEvent>>,
) -> Result<RenderResult, RenderError> {
    let backend = ResvgBackend::new(font_dirs);
    render_with_backend(&backend, catalog, output_dir, font_dirs, use_cache, progress)
}

/// Render using a specific backend (allows testing with mock).
pub fn render_with_backend(
    backend: &impl Rasterizer,
    catalog: &Catalog,
    output_dir: &Path,
    font_dirs: &[PathBuf],
    use_cache: bool,
    progress: Option<Sender<RenderEvent>>,
) -> Result<RenderResult, RenderError> {
    std::fs::create_dir_all(output_dir)?;
    let mut manifest = if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    };
    let raster_hash = cache::hash_raster_params(Dimensions::SHARE_CARD, font_dirs);
    let mut stats = CacheStats::default();
    let mut images = Vec::new();

    let samples = &catalog.config.images.sample_scores;
    for (index, game) in catalog.games.iter().enumerate() {
        if let Some(tx) = &progress {
            tx.send(RenderEvent::GameStarted {
                index: index + 1,
                name: game.name.clone(),
                image_count: 1 + samples.len(),
            })
            .ok();
        }

        let scores = std::iter::once(None).chain(samples.iter().map(|s| Some(s.as_str())));
        let jobs: Vec<Job> = scores
            .map(|score| {
                let card = ShareCard::for_game(game, score, &catalog.config);
                let rel_path = image_rel_path(&game.slug, score);
                let params = plan_share_png(&card, &output_dir.join(&rel_path));
                let svg_hash = cache::hash_svg(&params.svg);
                Job {
                    game,
                    score,
                    rel_path,
                    params,
                    svg_hash,
                }
            })
            .collect();

        // Resolve cache hits and copies; collect misses
        let mut misses = Vec::new();
        for job in jobs {
            match manifest.find_cached(&job.svg_hash, &raster_hash, output_dir) {
                Some(stored) if stored == job.rel_path => {
                    stats.hit();
                    emit(&progress, &job, RenderStatus::Cached);
                    images.push(job.finish(RenderStatus::Cached));
                }
                Some(stored) => {
                    if let Some(parent) = job.params.output.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::copy(output_dir.join(&stored), &job.params.output)?;
                    manifest.insert(job.rel_path.clone(), job.svg_hash.clone(), raster_hash.clone());
                    stats.copy();
                    emit(&progress, &job, RenderStatus::Copied);
                    images.push(job.finish(RenderStatus::Copied));
                }
                None => misses.push(job),
            }
        }

        let results: Vec<Result<(), RenderError>> = misses
            .par_iter()
            .map(|job| {
                backend
                    .write_png(&job.params)
                    .map_err(|source| RenderError::Imaging {
                        path: job.rel_path.clone(),
                        source,
                    })?;
                emit(&progress, job, RenderStatus::Rendered);
                Ok(())
            })
            .collect();

        for (job, result) in misses.iter().zip(results) {
            result?;
            manifest.insert(job.rel_path.clone(), job.svg_hash.clone(), raster_hash.clone());
            stats.miss();
            images.push(job.finish(RenderStatus::Rendered));
        }
    }

    manifest.save(output_dir)?;
    Ok(RenderResult {
        images,
        cache_stats: stats,
    })
}

fn emit(progress: &Option<Sender<RenderEvent>>, job: &Job, status: RenderStatus) {
    if let Some(tx) = progress {
        tx.send(RenderEvent::ImageRendered {
            label: job.label(),
            path: job.rel_path.clone(),
            status,
        })
        .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_with_samples(samples: &[&str]) -> (TempDir, Catalog) {
        let content = setup_content();
        let mut catalog = crate::catalog::scan(content.path()).unwrap();
        catalog.config.images.sample_scores = samples.iter().map(|s| s.to_string()).collect();
        (content, catalog)
    }

    #[test]
    fn image_paths_mirror_routes() {
        assert_eq!(image_rel_path("beam", None), "beam/opengraph-image.png");
        assert_eq!(
            image_rel_path("beam", Some("1234")),
            "beam/share/1234/opengraph-image.png"
        );
    }

    #[test]
    fn renders_card_and_samples_for_every_game() {
        let (_content, catalog) = catalog_with_samples(&["0", "1234"]);
        let out = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let result = render_with_backend(&backend, &catalog, out.path(), &[], true, None).unwrap();

        assert_eq!(result.images.len(), catalog.games.len() * 3);
        assert_eq!(backend.render_count(), catalog.games.len() * 3);
        assert_eq!(result.cache_stats.misses as usize, catalog.games.len() * 3);
        for game in &catalog.games {
            assert!(out.path().join(image_rel_path(&game.slug, None)).exists());
            assert!(out.path().join(image_rel_path(&game.slug, Some("0"))).exists());
            assert!(out.path().join(image_rel_path(&game.slug, Some("1234"))).exists());
        }
    }

    #[test]
    fn every_render_is_share_card_sized() {
        let (_content, catalog) = catalog_with_samples(&["7"]);
        let out = TempDir::new().unwrap();
        let backend = MockBackend::new();
        render_with_backend(&backend, &catalog, out.path(), &[], true, None).unwrap();

        for op in backend.get_operations() {
            let RecordedOp::Render { width, height, .. } = op;
            assert_eq!((width, height), (1200, 630));
        }
    }

    #[test]
    fn second_run_is_fully_cached() {
        let (_content, catalog) = catalog_with_samples(&["42"]);
        let out = TempDir::new().unwrap();

        let first = MockBackend::new();
        render_with_backend(&first, &catalog, out.path(), &[], true, None).unwrap();

        let second = MockBackend::new();
        let result = render_with_backend(&second, &catalog, out.path(), &[], true, None).unwrap();
        assert_eq!(second.render_count(), 0);
        assert_eq!(result.cache_stats.misses, 0);
        assert_eq!(result.cache_stats.hits as usize, catalog.games.len() * 2);
        assert!(result.images.iter().all(|i| i.status == RenderStatus::Cached));
    }

    #[test]
    fn no_cache_rerenders_everything() {
        let (_content, catalog) = catalog_with_samples(&[]);
        let out = TempDir::new().unwrap();
        render_with_backend(&MockBackend::new(), &catalog, out.path(), &[], true, None).unwrap();

        let backend = MockBackend::new();
        render_with_backend(&backend, &catalog, out.path(), &[], false, None).unwrap();
        assert_eq!(backend.render_count(), catalog.games.len());
    }

    #[test]
    fn palette_change_invalidates_only_that_game() {
        let (_content, mut catalog) = catalog_with_samples(&[]);
        let out = TempDir::new().unwrap();
        render_with_backend(&MockBackend::new(), &catalog, out.path(), &[], true, None).unwrap();

        catalog.games[0].colors.accent = "#123456".into();
        let backend = MockBackend::new();
        let result = render_with_backend(&backend, &catalog, out.path(), &[], true, None).unwrap();
        assert_eq!(backend.render_count(), 1);
        assert_eq!(result.cache_stats.misses, 1);
    }

    #[test]
    fn renamed_slug_copies_instead_of_rendering() {
        let (_content, mut catalog) = catalog_with_samples(&[]);
        let out = TempDir::new().unwrap();
        render_with_backend(&MockBackend::new(), &catalog, out.path(), &[], true, None).unwrap();

        catalog.games[0].slug = "renamed".into();
        let backend = MockBackend::new();
        let result = render_with_backend(&backend, &catalog, out.path(), &[], true, None).unwrap();
        assert_eq!(backend.render_count(), 0);
        assert_eq!(result.cache_stats.copies, 1);
        assert!(out.path().join("renamed/opengraph-image.png").exists());
    }

    #[test]
    fn font_dirs_change_invalidates_cache() {
        let (_content, catalog) = catalog_with_samples(&[]);
        let out = TempDir::new().unwrap();
        render_with_backend(&MockBackend::new(), &catalog, out.path(), &[], true, None).unwrap();

        let backend = MockBackend::new();
        let fonts = [PathBuf::from("fonts")];
        render_with_backend(&backend, &catalog, out.path(), &fonts, true, None).unwrap();
        assert_eq!(backend.render_count(), catalog.games.len());
    }

    #[test]
    fn backend_failure_names_the_image() {
        let (_content, catalog) = catalog_with_samples(&[]);
        let out = TempDir::new().unwrap();
        let backend = MockBackend::failing("no pixels");
        let err = render_with_backend(&backend, &catalog, out.path(), &[], true, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("opengraph-image.png"), "{msg}");
        assert!(msg.contains("no pixels"), "{msg}");
    }

    #[test]
    fn progress_events_are_sent() {
        let (_content, catalog) = catalog_with_samples(&["5"]);
        let out = TempDir::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        render_with_backend(&MockBackend::new(), &catalog, out.path(), &[], true, Some(tx)).unwrap();

        let events: Vec<RenderEvent> = rx.into_iter().collect();
        let started = events
            .iter()
            .filter(|e| matches!(e, RenderEvent::GameStarted { image_count: 2, .. }))
            .count();
        assert_eq!(started, catalog.games.len());
        assert!(events.iter().any(|e| matches!(
            e,
            RenderEvent::ImageRendered { label, status: RenderStatus::Rendered, .. } if label == "score 5"
        )));
    }

    #[test]
    fn manifest_is_written() {
        let (_content, catalog) = catalog_with_samples(&[]);
        let out = TempDir::new().unwrap();
        render_with_backend(&MockBackend::new(), &catalog, out.path(), &[], true, None).unwrap();
        let manifest = fs::read_to_string(cache::manifest_path(out.path())).unwrap();
        assert!(manifest.contains("beam/opengraph-image.png"));
    }
}
