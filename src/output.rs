//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every entity (game, lab, image, page) is shown by its identity first:
//! positional index and display name. Slugs and output paths follow as
//! indented context lines, so the output reads as an inventory of the arcade
//! while still pointing at the files involved.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Games
//! 001 BEAM (4 decorations)
//!     Slug: beam
//!     Dodge the light.
//!     Lab: Building BEAM (5 entries)
//! 002 SPROUT RUN (4 decorations)
//!     Slug: sprout-run
//!     Grow fast. Jump faster.
//!
//! Unlisted
//!     proto-snake SNAKE (PROTO)
//!
//! Config
//!     https://pixelpit.gg/pixelpit/arcade
//!     3 sample scores
//!     1 redirect rule
//! ```
//!
//! ## Render
//!
//! ```text
//! 001 BEAM (4 images)
//!     card: rendered
//!     score 0: cached
//!     score 100: copied
//! ```
//!
//! ## Generate
//!
//! ```text
//! Share
//!     BEAM | Pixelpit Arcade → pixelpit/arcade/beam/share/index.html
//!     I scored 100 on BEAM → pixelpit/arcade/beam/share/100/index.html
//!
//! Labs
//!     Labs | Pixelpit Arcade → pixelpit/arcade/labs/index.html
//!     Building BEAM | Pixelpit Arcade Lab → pixelpit/arcade/beam/lab/index.html
//!
//! Routing
//!     1 redirect rules → _redirects
//!     14 routes → metadata.json
//!
//! Generated 2 lab pages, 8 share pages, 24 images, 1 asset
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::catalog::Catalog;
use crate::generate::{GenerateSummary, PageKind};
use crate::render::{RenderEvent, RenderStatus};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// `1 thing` / `2 things`.
fn plural(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {singular}s")
    }
}

/// Format an entity header: positional index + name, with optional detail.
///
/// ```text
/// 001 BEAM (4 decorations)
/// 002 ORBIT
/// ```
fn entity_header(index: usize, name: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), name, d),
        None => format!("{} {}", format_index(index), name),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing the discovered games, labs and config.
pub fn format_scan_output(catalog: &Catalog) -> Vec<String> {
    let mut lines = vec!["Games".to_string()];

    for (i, game) in catalog.listed_games().enumerate() {
        let detail = (!game.decorations.is_empty())
            .then(|| plural(game.decorations.len(), "decoration"));
        lines.push(entity_header(i + 1, &game.name, detail.as_deref()));
        lines.push(format!("    Slug: {}", game.slug));
        lines.push(format!("    {}", truncate_desc(game.tagline.trim(), 60)));
        if let Some(lab) = catalog.lab(&game.slug) {
            let entries = match lab.entries.len() {
                1 => "1 entry".to_string(),
                n => format!("{n} entries"),
            };
            lines.push(format!("    Lab: {} ({})", lab.title, entries));
        }
    }

    let unlisted: Vec<_> = catalog.games.iter().filter(|g| !g.listed).collect();
    if !unlisted.is_empty() {
        lines.push(String::new());
        lines.push("Unlisted".to_string());
        for game in unlisted {
            lines.push(format!("    {} {}", game.slug, game.name));
        }
    }

    let config = &catalog.config;
    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(format!(
        "    {}{}",
        config.site.base_url.trim_end_matches('/'),
        config.site.arcade_path
    ));
    lines.push(format!(
        "    {}",
        plural(config.images.sample_scores.len(), "sample score")
    ));
    lines.push(format!(
        "    {}",
        plural(config.redirects.len(), "redirect rule")
    ));

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(catalog: &Catalog) {
    for line in format_scan_output(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Render output
// ============================================================================

/// Format a single render progress event as display lines.
pub fn format_render_event(event: &RenderEvent) -> Vec<String> {
    match event {
        RenderEvent::GameStarted {
            index,
            name,
            image_count,
        } => vec![entity_header(
            *index,
            name,
            Some(&plural(*image_count, "image")),
        )],
        RenderEvent::ImageRendered { label, status, .. } => {
            let status_str = match status {
                RenderStatus::Cached => "cached",
                RenderStatus::Copied => "copied",
                RenderStatus::Rendered => "rendered",
            };
            vec![format!("    {}: {}", label, status_str)]
        }
    }
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

fn section(kind: PageKind) -> &'static str {
    match kind {
        PageKind::ShareShell | PageKind::SharePage => "Share",
        PageKind::Lab | PageKind::LabsIndex => "Labs",
        PageKind::Redirects | PageKind::Metadata => "Routing",
    }
}

/// Format generate stage output: every written file grouped by section,
/// followed by a one-line summary.
pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for name in ["Share", "Labs", "Routing"] {
        let pages: Vec<_> = summary
            .pages
            .iter()
            .filter(|p| section(p.kind) == name)
            .collect();
        if pages.is_empty() {
            continue;
        }
        lines.push(name.to_string());
        for page in pages {
            lines.push(format!("    {} \u{2192} {}", page.title, page.path));
        }
        lines.push(String::new());
    }

    let lab_pages = summary.count(PageKind::Lab) + summary.count(PageKind::LabsIndex);
    let share_pages = summary.count(PageKind::ShareShell) + summary.count(PageKind::SharePage);
    lines.push(format!(
        "Generated {}, {}, {}, {}",
        plural(lab_pages, "lab page"),
        plural(share_pages, "share page"),
        plural(summary.images_copied, "image"),
        plural(summary.assets_copied, "asset"),
    ));

    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
