//! Static site generation.
//!
//! Stage 3 of the build pipeline. Takes the catalog and the rendered share
//! images and writes everything a static host needs to serve the arcade's
//! marketing surface.
//!
//! ## Generated Files
//!
//! - **Lab pages** (`<arcade>/<slug>/lab/index.html`): build transcript with
//!   a markdown intro, the cast list and the emphasized message log
//! - **Labs index** (`<arcade>/labs/index.html`): labs of listed games
//! - **Share shells** (`<arcade>/<slug>/share/index.html`): score-less share
//!   metadata plus a forwarder to the live game that keeps the query string
//! - **Sample share pages** (`<arcade>/<slug>/share/<score>/index.html`):
//!   the same shell with score metadata, one per pre-rendered sample score
//! - **`_redirects`**: configured redirect rules plus share rewrites
//! - **`metadata.json`**: route path → [`PageMeta`] for every page above
//!   and for each live game route
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── _redirects
//! ├── metadata.json
//! ├── favicon.ico                          # from content/assets/
//! └── pixelpit/arcade/
//!     ├── labs/index.html
//!     └── beam/
//!         ├── opengraph-image.png
//!         ├── lab/index.html
//!         └── share/
//!             ├── index.html
//!             └── 1234/
//!                 ├── index.html
//!                 └── opengraph-image.png
//! ```
//!
//! ## CSS and JavaScript
//!
//! Embedded at compile time: `static/style.css` (palette custom properties
//! are prepended per page) and `static/forward.js` (share forwarder).

use crate::catalog::Catalog;
use crate::metadata::{self, PageMeta};
use crate::routes::{self, RouteError, Routes};
use crate::transcript::emphasis_markup;
use crate::types::{GameDescriptor, Lab, Palette};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Route error: {0}")]
    Route(#[from] RouteError),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const FORWARD_JS: &str = include_str!("../static/forward.js");

/// Kind of file written by the generate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Lab,
    LabsIndex,
    ShareShell,
    SharePage,
    Redirects,
    Metadata,
}

#[derive(Debug, Clone)]
pub struct GeneratedPage {
    pub kind: PageKind,
    pub title: String,
    /// Path relative to the output directory.
    pub path: String,
}

#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub pages: Vec<GeneratedPage>,
    pub images_copied: usize,
    pub assets_copied: usize,
}

impl GenerateSummary {
    pub fn count(&self, kind: PageKind) -> usize {
        self.pages.iter().filter(|p| p.kind == kind).count()
    }
}

pub fn generate(
    catalog: &Catalog,
    rendered_dir: &Path,
    output_dir: &Path,
    source_root: &Path,
) -> Result<GenerateSummary, GenerateError> {
    let routes = Routes::new(&catalog.config.site)?;
    let site = &catalog.config.site;
    let arcade_rel: PathBuf = site
        .arcade_path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let arcade_dir = output_dir.join(&arcade_rel);
    fs::create_dir_all(&arcade_dir)?;

    let mut summary = GenerateSummary {
        images_copied: copy_tree(rendered_dir, &arcade_dir, |p| {
            p.extension().is_some_and(|e| e == "png")
        })?,
        assets_copied: copy_tree(&source_root.join("assets"), output_dir, |_| true)?,
        ..GenerateSummary::default()
    };
    let mut meta_index: BTreeMap<String, PageMeta> = BTreeMap::new();
    let mut write_page = |kind: PageKind, rel: PathBuf, meta: &PageMeta, html: Markup| -> Result<(), GenerateError> {
        let path = arcade_dir.join(&rel).join("index.html");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, html.into_string())?;
        summary.pages.push(GeneratedPage {
            kind,
            title: meta.title.clone(),
            path: arcade_rel.join(&rel).join("index.html").to_string_lossy().replace('\\', "/"),
        });
        Ok(())
    };

    for game in &catalog.games {
        let game_meta = metadata::game_page_meta(&routes, site, game);
        meta_index.insert(path_of(&game_meta), game_meta);

        let shell_meta = metadata::share_page_meta(&routes, site, game, None);
        let shell = render_share_page(&routes, game, &shell_meta, None);
        write_page(
            PageKind::ShareShell,
            PathBuf::from(&game.slug).join("share"),
            &shell_meta,
            shell,
        )?;
        meta_index.insert(path_of(&shell_meta), shell_meta);

        for score in &catalog.config.images.sample_scores {
            let meta = metadata::share_page_meta(&routes, site, game, Some(score));
            let page = render_share_page(&routes, game, &meta, None);
            write_page(
                PageKind::SharePage,
                PathBuf::from(&game.slug).join("share").join(score),
                &meta,
                page,
            )?;
            meta_index.insert(path_of(&meta), meta);
        }
    }

    for lab in catalog.labs.values() {
        // Orphan labs are rejected by the scan stage
        let Some(game) = catalog.game(&lab.slug) else {
            continue;
        };
        let meta = metadata::lab_page_meta(&routes, site, game, lab);
        let page = render_lab_page(&routes, game, lab, &meta, &site.name);
        write_page(PageKind::Lab, PathBuf::from(&game.slug).join("lab"), &meta, page)?;
        meta_index.insert(path_of(&meta), meta);
    }

    let listed: Vec<(&GameDescriptor, &Lab)> = catalog
        .listed_games()
        .filter_map(|g| catalog.lab(&g.slug).map(|l| (g, l)))
        .collect();
    if let Some((lead, _)) = listed.first() {
        let meta = metadata::labs_index_meta(&routes, site, lead);
        let page = render_labs_index(&routes, &listed, &meta, &site.name);
        write_page(PageKind::LabsIndex, PathBuf::from("labs"), &meta, page)?;
        meta_index.insert(path_of(&meta), meta);
    }

    let redirects = routes::render_redirects_file(&catalog.config.redirects, &routes, catalog);
    fs::write(output_dir.join("_redirects"), redirects)?;
    summary.pages.push(GeneratedPage {
        kind: PageKind::Redirects,
        title: format!("{} redirect rules", catalog.config.redirects.len()),
        path: "_redirects".to_string(),
    });

    fs::write(
        output_dir.join("metadata.json"),
        serde_json::to_string_pretty(&meta_index)?,
    )?;
    summary.pages.push(GeneratedPage {
        kind: PageKind::Metadata,
        title: format!("{} routes", meta_index.len()),
        path: "metadata.json".to_string(),
    });

    Ok(summary)
}

/// Route path of a page, the key of `metadata.json`.
fn path_of(meta: &PageMeta) -> String {
    url::Url::parse(&meta.canonical_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| meta.canonical_url.clone())
}

/// Copy files under `src` matching `keep` into `dst`. Missing `src` copies nothing.
fn copy_tree(src: &Path, dst: &Path, keep: impl Fn(&Path) -> bool) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !keep(path) {
            continue;
        }
        let Ok(rel) = path.strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)?;
        copied += 1;
    }
    Ok(copied)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Palette as CSS custom properties, overriding the stylesheet defaults.
pub fn palette_css(palette: &Palette) -> String {
    format!(
        ":root {{\n    --background: {};\n    --primary: {};\n    --secondary: {};\n    --accent: {};\n    --text: {};\n}}",
        palette.background, palette.primary, palette.secondary, palette.accent, palette.text
    )
}

/// Renders the base HTML document structure
fn base_document(meta: &PageMeta, palette: Option<&Palette>, head_extra: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (meta.head_tags())
                style {
                    (PreEscaped(CSS_STATIC))
                    @if let Some(palette) = palette {
                        "\n" (PreEscaped(palette_css(palette)))
                    }
                }
                (head_extra)
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(routes: &Routes, site_name: &str) -> Markup {
    html! {
        header class="site-header" {
            a href=(routes.arcade_path()) { (site_name) }
            a href=(routes.labs_index().path()) { "Labs" }
        }
    }
}

/// Share page: social metadata for crawlers, a forward to the game for people.
///
/// With `query` the forward target is fixed server-side; without it the
/// script appends whatever query string the page was opened with. A static
/// page cannot see its query, so it gets no meta refresh and the script also
/// patches the fallback link.
pub fn render_share_page(
    routes: &Routes,
    game: &GameDescriptor,
    meta: &PageMeta,
    query: Option<&str>,
) -> Markup {
    let target = routes::share_forward_target(routes, &game.slug, query);
    let target_js = serde_json::to_string(&target)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace("</", "<\\/");
    let head = html! {
        @if query.is_some() {
            meta http-equiv="refresh" content={ "0; url=" (target) };
        }
        script { (PreEscaped(format!("var target = {target_js};\n{FORWARD_JS}"))) }
    };
    let content = html! {
        main class="forwarding" {
            p { "Taking you to " a id="forward-link" href=(target) { (game.name) } "…" }
        }
    };
    base_document(meta, Some(&game.colors), head, content)
}

/// Renders a lab transcript page.
pub fn render_lab_page(
    routes: &Routes,
    game: &GameDescriptor,
    lab: &Lab,
    meta: &PageMeta,
    site_name: &str,
) -> Markup {
    let intro_html = lab.intro.as_deref().map(|intro| {
        let mut out = String::new();
        md_html::push_html(&mut out, Parser::new(intro));
        out
    });
    let speaker_color = |id: &str| {
        lab.speakers
            .get(id)
            .and_then(|s| game.colors.resolve(&s.color))
            .unwrap_or(game.colors.text.as_str())
            .to_string()
    };

    let content = html! {
        (site_header(routes, site_name))
        main class="lab" {
            h1 { (lab.title) }
            p class="tagline" {
                a href=(routes.game(&game.slug).path()) { "Play " (game.name) }
                " · " (game.tagline)
            }
            @if let Some(intro) = intro_html {
                section class="intro" { (PreEscaped(intro)) }
            }
            ul class="cast" {
                @for (id, speaker) in &lab.speakers {
                    li {
                        span class="speaker" style={ "color: " (speaker_color(id)) } { (speaker.name) }
                        @if let Some(role) = &speaker.role {
                            " " span class="role" { "(" (role) ")" }
                        }
                    }
                }
            }
            ol class="transcript" {
                @for entry in &lab.entries {
                    @let name = lab.speakers.get(&entry.speaker).map(|s| s.name.as_str()).unwrap_or(entry.speaker.as_str());
                    li class="entry" {
                        span class="time" { (entry.time) }
                        div {
                            span class="speaker" style={ "color: " (speaker_color(&entry.speaker)) } { (name) }
                            div class="body" { (emphasis_markup(&entry.body)) }
                        }
                    }
                }
            }
        }
    };
    base_document(meta, Some(&game.colors), html! {}, content)
}

/// Renders the labs index.
pub fn render_labs_index(
    routes: &Routes,
    labs: &[(&GameDescriptor, &Lab)],
    meta: &PageMeta,
    site_name: &str,
) -> Markup {
    let content = html! {
        (site_header(routes, site_name))
        main class="labs" {
            h1 { "Labs" }
            p class="tagline" { (meta.description) }
            ul class="lab-list" {
                @for (game, lab) in labs {
                    li {
                        a href=(routes.lab(&game.slug).path()) style={ "border-color: " (game.colors.accent) } {
                            span class="name" style={ "color: " (game.colors.primary) } { (game.name) }
                            span class="title" { (lab.title) }
                        }
                    }
                }
            }
        }
    };
    base_document(meta, None, html! {}, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn build(samples: &[&str]) -> (TempDir, TempDir, Catalog, GenerateSummary) {
        let content = setup_content();
        let mut catalog = crate::catalog::scan(content.path()).unwrap();
        catalog.config.images.sample_scores = samples.iter().map(|s| s.to_string()).collect();
        let rendered = TempDir::new().unwrap();
        for game in &catalog.games {
            let card = rendered.path().join(&game.slug).join("opengraph-image.png");
            fs::create_dir_all(card.parent().unwrap()).unwrap();
            fs::write(&card, b"png").unwrap();
        }
        fs::write(rendered.path().join(".render-cache.json"), "{}").unwrap();
        let out = TempDir::new().unwrap();
        let summary = generate(&catalog, rendered.path(), out.path(), content.path()).unwrap();
        (content, out, catalog, summary)
    }

    fn read(out: &TempDir, rel: &str) -> String {
        fs::read_to_string(out.path().join(rel)).unwrap()
    }

    #[test]
    fn copies_images_under_arcade_path() {
        let (_c, out, catalog, summary) = build(&[]);
        assert_eq!(summary.images_copied, catalog.games.len());
        assert!(out.path().join("pixelpit/arcade/beam/opengraph-image.png").exists());
        assert!(!out.path().join("pixelpit/arcade/.render-cache.json").exists());
    }

    #[test]
    fn writes_share_shell_per_game() {
        let (_c, out, catalog, summary) = build(&[]);
        assert_eq!(summary.count(PageKind::ShareShell), catalog.games.len());
        let html = read(&out, "pixelpit/arcade/beam/share/index.html");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"var target = "/pixelpit/arcade/beam";"#));
        assert!(html.contains("window.location.search"));
        assert!(html.contains(
            r#"<meta property="og:image" content="https://pixelpit.gg/pixelpit/arcade/beam/opengraph-image">"#
        ));
    }

    #[test]
    fn static_share_pages_never_refresh_to_a_bare_target() {
        let (_c, out, _catalog, _summary) = build(&["1234"]);
        for page in [
            "pixelpit/arcade/beam/share/index.html",
            "pixelpit/arcade/beam/share/1234/index.html",
        ] {
            let html = read(&out, page);
            assert!(!html.contains(r#"http-equiv="refresh""#), "{page}");
            assert!(html.contains(r#"<a id="forward-link" href="/pixelpit/arcade/beam">"#));
            assert!(html.contains("link.href = url"));
        }
    }

    #[test]
    fn writes_sample_share_pages() {
        let (_c, out, _catalog, summary) = build(&["1234"]);
        assert!(summary.count(PageKind::SharePage) > 0);
        let html = read(&out, "pixelpit/arcade/beam/share/1234/index.html");
        assert!(html.contains("<title>I scored 1234 on BEAM</title>"));
        assert!(html.contains("/beam/share/1234/opengraph-image"));
    }

    #[test]
    fn writes_lab_pages_with_emphasis() {
        let (_c, out, catalog, summary) = build(&[]);
        assert_eq!(summary.count(PageKind::Lab), catalog.labs.len());
        let html = read(&out, "pixelpit/arcade/beam/lab/index.html");
        assert!(html.contains("class=\"transcript\""));
        assert!(html.contains("<strong>") || html.contains("<em>") || html.contains("<code>"));
        assert!(html.contains("--accent: "));
    }

    #[test]
    fn labs_index_lists_listed_labs() {
        let (_c, out, _catalog, summary) = build(&[]);
        assert_eq!(summary.count(PageKind::LabsIndex), 1);
        let html = read(&out, "pixelpit/arcade/labs/index.html");
        assert!(html.contains(r#"href="/pixelpit/arcade/beam/lab""#));
    }

    #[test]
    fn writes_redirects_file() {
        let (_c, out, _catalog, _summary) = build(&[]);
        let redirects = read(&out, "_redirects");
        assert!(redirects.contains("/pp/*  /pixelpit/arcade/:splat  308"));
        assert!(redirects.contains(
            "/pixelpit/arcade/beam/share/*  /pixelpit/arcade/beam/share/index.html  200"
        ));
    }

    #[test]
    fn writes_metadata_index() {
        let (_c, out, _catalog, _summary) = build(&["7"]);
        let json: serde_json::Value = serde_json::from_str(&read(&out, "metadata.json")).unwrap();
        assert_eq!(json["/pixelpit/arcade/beam"]["title"], "BEAM | Pixelpit Arcade");
        assert_eq!(json["/pixelpit/arcade/beam/share/7"]["title"], "I scored 7 on BEAM");
        assert!(json["/pixelpit/arcade/beam/lab"].is_object());
    }

    #[test]
    fn copies_assets_to_output_root() {
        let (_c, out, _catalog, summary) = build(&[]);
        assert!(summary.assets_copied >= 1);
        assert!(out.path().join("robots.txt").exists());
    }

    #[test]
    fn server_side_share_page_fixes_query() {
        let content = setup_content();
        let catalog = crate::catalog::scan(content.path()).unwrap();
        let routes = Routes::new(&catalog.config.site).unwrap();
        let game = find_game(&catalog, "beam");
        let meta = metadata::share_page_meta(&routes, &catalog.config.site, game, Some("5"));
        let html = render_share_page(&routes, game, &meta, Some("ref=tw&x=%20")).into_string();
        assert!(html.contains(r#"var target = "/pixelpit/arcade/beam?ref=tw&x=%20";"#));
        assert!(html.contains(r#"content="0; url=/pixelpit/arcade/beam?ref=tw&amp;x=%20""#));
    }

    #[test]
    fn palette_css_lists_every_role() {
        let content = setup_content();
        let catalog = crate::catalog::scan(content.path()).unwrap();
        let css = palette_css(&find_game(&catalog, "beam").colors);
        for role in ["--background", "--primary", "--secondary", "--accent", "--text"] {
            assert!(css.contains(role));
        }
    }
}
