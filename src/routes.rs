//! URL layout of the arcade and the static redirect table.
//!
//! Every game lives under the configured arcade prefix:
//!
//! ```text
//! <arcade>/<game>                                   live game (external)
//! <arcade>/<game>/opengraph-image                   game card PNG
//! <arcade>/<game>/share/<score>                     share page → forwards to <arcade>/<game>
//! <arcade>/<game>/share/<score>/opengraph-image     score share PNG
//! <arcade>/<game>/lab                               build transcript
//! <arcade>/labs                                     lab index
//! ```
//!
//! [`Routes`] builds these as absolute [`Url`]s so path segments (the score
//! in particular) are percent-encoded exactly once.
//!
//! ## Redirect patterns
//!
//! [`RedirectRule`] patterns are slash-separated. A segment `:name` captures
//! one path segment and `:name*` captures the remainder of the path
//! verbatim (zero or more segments). Captures are substituted by name into
//! the target pattern.

use crate::catalog::Catalog;
use crate::config::SiteSection;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid base URL '{0}': {1}")]
    BaseUrl(String, url::ParseError),
    #[error("base URL '{0}' cannot carry a path")]
    CannotBeABase(String),
}

/// Route builder bound to one site's base URL and arcade prefix.
#[derive(Debug, Clone)]
pub struct Routes {
    base: Url,
    arcade: Vec<String>,
}

impl Routes {
    pub fn new(site: &SiteSection) -> Result<Self, RouteError> {
        let base = Url::parse(&site.base_url)
            .map_err(|e| RouteError::BaseUrl(site.base_url.clone(), e))?;
        if base.cannot_be_a_base() {
            return Err(RouteError::CannotBeABase(site.base_url.clone()));
        }
        let arcade = site
            .arcade_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Ok(Self { base, arcade })
    }

    fn url(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear();
            segments.extend(&self.arcade);
            segments.extend(tail);
        }
        url
    }

    /// The arcade prefix as a path, e.g. `/pixelpit/arcade`.
    pub fn arcade_path(&self) -> String {
        self.url(&[]).path().to_string()
    }

    /// The live game route, owned by the game app.
    pub fn game(&self, slug: &str) -> Url {
        self.url(&[slug])
    }

    /// The share page. A missing or blank score yields the bare share route.
    pub fn share(&self, slug: &str, score: Option<&str>) -> Url {
        match present(score) {
            Some(score) => self.url(&[slug, "share", score]),
            None => self.url(&[slug, "share"]),
        }
    }

    /// The image for a share page; the card image when the score is missing.
    pub fn share_image(&self, slug: &str, score: Option<&str>) -> Url {
        match present(score) {
            Some(score) => self.url(&[slug, "share", score, "opengraph-image"]),
            None => self.card_image(slug),
        }
    }

    pub fn card_image(&self, slug: &str) -> Url {
        self.url(&[slug, "opengraph-image"])
    }

    pub fn lab(&self, slug: &str) -> Url {
        self.url(&[slug, "lab"])
    }

    pub fn labs_index(&self) -> Url {
        self.url(&["labs"])
    }
}

/// `Some(score)` unless the score is absent or blank.
pub fn present(score: Option<&str>) -> Option<&str> {
    score.filter(|s| !s.trim().is_empty())
}

/// Path of the live game a share page forwards to, carrying the original
/// query string byte for byte.
pub fn share_forward_target(routes: &Routes, slug: &str, query: Option<&str>) -> String {
    let game = routes.game(slug);
    with_query(game.path(), query)
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    }
}

// ============================================================================
// Redirect rules
// ============================================================================

/// One static redirect, e.g. `/pp/:path*` → `/pixelpit/arcade/:path*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectRule {
    pub from: String,
    pub to: String,
    /// 308 when true, 307 otherwise.
    #[serde(default)]
    pub permanent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Splat(&'a str),
}

fn parse_pattern(pattern: &str) -> Vec<Segment<'_>> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix(':') {
            Some(name) => match name.strip_suffix('*') {
                Some(name) => Segment::Splat(name),
                None => Segment::Param(name),
            },
            None => Segment::Literal(s),
        })
        .collect()
}

/// Split `"a/b/c"` into `("a", "b/c")`.
fn split_segment(path: &str) -> (&str, &str) {
    path.split_once('/').unwrap_or((path, ""))
}

/// A matched redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub permanent: bool,
}

impl Redirect {
    pub fn status(&self) -> u16 {
        if self.permanent { 308 } else { 307 }
    }
}

impl RedirectRule {
    /// Check the patterns are well-formed and every target capture is bound.
    pub fn validate(&self) -> Result<(), String> {
        for (field, pattern) in [("from", &self.from), ("to", &self.to)] {
            if !pattern.starts_with('/') {
                return Err(format!(
                    "redirect {field} pattern '{pattern}' must start with '/'"
                ));
            }
        }
        let from = parse_pattern(&self.from);
        for (i, seg) in from.iter().enumerate() {
            match seg {
                Segment::Param("") | Segment::Splat("") => {
                    return Err(format!("redirect '{}' has an unnamed capture", self.from));
                }
                Segment::Splat(_) if i + 1 != from.len() => {
                    return Err(format!(
                        "redirect '{}': a ':name*' capture must be the last segment",
                        self.from
                    ));
                }
                _ => {}
            }
        }
        for seg in parse_pattern(&self.to) {
            if let Segment::Param(name) | Segment::Splat(name) = seg {
                let bound = from
                    .iter()
                    .any(|f| matches!(f, Segment::Param(n) | Segment::Splat(n) if *n == name));
                if !bound {
                    return Err(format!(
                        "redirect target '{}' uses ':{name}', which '{}' does not capture",
                        self.to, self.from
                    ));
                }
            }
        }
        Ok(())
    }

    /// Match `path` against `from` and build the target path.
    ///
    /// Captured segments are copied verbatim: no decoding, no re-encoding.
    pub fn apply(&self, path: &str) -> Option<String> {
        let mut rest = path.strip_prefix('/')?;
        let mut captures: Vec<(&str, &str)> = Vec::new();

        for seg in parse_pattern(&self.from) {
            match seg {
                Segment::Literal(literal) => {
                    let (head, tail) = split_segment(rest);
                    if head != literal {
                        return None;
                    }
                    rest = tail;
                }
                Segment::Param(name) => {
                    let (head, tail) = split_segment(rest);
                    if head.is_empty() {
                        return None;
                    }
                    captures.push((name, head));
                    rest = tail;
                }
                Segment::Splat(name) => {
                    captures.push((name, rest));
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            return None;
        }

        let mut target = String::new();
        for seg in parse_pattern(&self.to) {
            let value = match seg {
                Segment::Literal(literal) => literal,
                Segment::Param(name) | Segment::Splat(name) => captures
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| *v)
                    .unwrap_or_default(),
            };
            if !value.is_empty() {
                target.push('/');
                target.push_str(value);
            }
        }
        if target.is_empty() {
            target.push('/');
        }
        Some(target)
    }

    /// This rule in `_redirects` file syntax (`*` / `:splat` for the tail capture).
    fn to_redirects_line(&self) -> String {
        let render = |pattern: &str, splat: &str| -> String {
            let mut out = String::new();
            for seg in parse_pattern(pattern) {
                out.push('/');
                match seg {
                    Segment::Literal(s) => out.push_str(s),
                    Segment::Param(name) => {
                        out.push(':');
                        out.push_str(name);
                    }
                    Segment::Splat(_) => out.push_str(splat),
                }
            }
            if out.is_empty() {
                out.push('/');
            }
            out
        };
        let status = if self.permanent { 308 } else { 307 };
        format!(
            "{}  {}  {}",
            render(&self.from, "*"),
            render(&self.to, ":splat"),
            status
        )
    }
}

/// Find the first rule matching `path` and build the redirect, preserving
/// the original query string.
pub fn resolve_redirect(
    rules: &[RedirectRule],
    path: &str,
    query: Option<&str>,
) -> Option<Redirect> {
    rules.iter().find_map(|rule| {
        rule.apply(path).map(|target| Redirect {
            location: with_query(&target, query),
            permanent: rule.permanent,
        })
    })
}

/// Render a `_redirects` file for static hosting.
///
/// Configured rules come first, then one rewrite per game that serves the
/// static share shell for any score. Pre-rendered share images shadow the
/// rewrite because the host only applies 200 rewrites to missing files.
pub fn render_redirects_file(rules: &[RedirectRule], routes: &Routes, catalog: &Catalog) -> String {
    let mut out = String::from("# Generated by pixelpit-press\n");
    for rule in rules {
        let _ = writeln!(out, "{}", rule.to_redirects_line());
    }
    for game in &catalog.games {
        let share = routes.share(&game.slug, None);
        let _ = writeln!(out, "{0}/*  {0}/index.html  200", share.path());
    }
    out
}
