//! On-demand HTTP surface for share pages and share images.
//!
//! The static build can only pre-render a fixed set of scores. The server
//! answers every score: it builds share metadata and rasterizes the share
//! image per request, straight from the in-memory catalog.
//!
//! ## Routes
//!
//! All routes are nested under `site.arcade_path`:
//!
//! | Route | Response |
//! |---|---|
//! | `GET /{game}/meta.json` | game page [`PageMeta`](crate::metadata::PageMeta) as JSON |
//! | `GET /{game}/opengraph-image` | game card PNG |
//! | `GET /{game}/share` | share page without a score |
//! | `GET /{game}/share/{score}` | share page; forwards to the game with the query string |
//! | `GET /{game}/share/{score}/opengraph-image` | score share PNG |
//! | `GET /{game}/lab` | lab transcript page |
//! | `GET /labs` | labs index |
//!
//! Anything else goes through the configured redirect rules (308 for
//! permanent rules, 307 otherwise, query string preserved) and 404s when no
//! rule matches.
//!
//! Rasterization is CPU-bound, so it runs on tokio's blocking pool.

mod error;

pub use error::AppError;

use crate::catalog::Catalog;
use crate::generate::{render_lab_page, render_labs_index, render_share_page};
use crate::imaging::{Rasterizer, render_share_png};
use crate::metadata;
use crate::routes::{RouteError, Routes, resolve_redirect};
use crate::share_image::ShareCard;
use crate::types::GameDescriptor;
use axum::Router;
use axum::extract::{Path, RawQuery, Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared, read-only state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub routes: Arc<Routes>,
    pub backend: Arc<dyn Rasterizer + Send>,
}

impl AppState {
    pub fn new(catalog: Catalog, backend: Arc<dyn Rasterizer + Send>) -> Result<Self, RouteError> {
        let routes = Routes::new(&catalog.config.site)?;
        Ok(Self {
            catalog: Arc::new(catalog),
            routes: Arc::new(routes),
            backend,
        })
    }

    fn game(&self, slug: &str) -> Result<&GameDescriptor, AppError> {
        self.catalog
            .game(slug)
            .ok_or_else(|| AppError::unknown_game(slug))
    }
}

/// Build the Axum router for a loaded catalog.
pub fn build_app(state: AppState) -> Router {
    let games = Router::new()
        .route("/labs", get(labs_index))
        .route("/{game}/meta.json", get(game_meta))
        .route("/{game}/opengraph-image", get(card_image))
        .route("/{game}/share", get(share_page))
        .route("/{game}/share/{score}", get(score_share_page))
        .route("/{game}/share/{score}/opengraph-image", get(score_image))
        .route("/{game}/lab", get(lab_page));

    let arcade = state.catalog.config.site.arcade_path.clone();
    Router::new()
        .nest(&arcade, games)
        .fallback(redirect_or_404)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        arcade = %state.routes.arcade_path(),
        games = state.catalog.games.len(),
        "serving share surfaces"
    );
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

// ============================================================================
// Handlers
// ============================================================================

async fn game_meta(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response, AppError> {
    let game = state.game(&slug)?;
    let meta = metadata::game_page_meta(&state.routes, &state.catalog.config.site, game);
    Ok(Json(meta).into_response())
}

async fn card_image(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response, AppError> {
    let png = rasterize(state, slug, None).await?;
    Ok(png_response(png, "public, max-age=3600"))
}

async fn score_image(
    State(state): State<AppState>,
    Path((slug, score)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let png = rasterize(state, slug, Some(score)).await?;
    // The image is a pure function of the score
    Ok(png_response(png, "public, max-age=31536000, immutable"))
}

async fn share_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, AppError> {
    share_html(&state, &slug, None, query.as_deref())
}

async fn score_share_page(
    State(state): State<AppState>,
    Path((slug, score)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, AppError> {
    share_html(&state, &slug, Some(&score), query.as_deref())
}

async fn lab_page(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Html<String>, AppError> {
    let game = state.game(&slug)?;
    let lab = state
        .catalog
        .lab(&slug)
        .ok_or_else(|| AppError::NotFound(format!("no lab for '{slug}'")))?;
    let site = &state.catalog.config.site;
    let meta = metadata::lab_page_meta(&state.routes, site, game, lab);
    Ok(Html(
        render_lab_page(&state.routes, game, lab, &meta, &site.name).into_string(),
    ))
}

async fn labs_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let labs: Vec<_> = state
        .catalog
        .listed_games()
        .filter_map(|g| state.catalog.lab(&g.slug).map(|l| (g, l)))
        .collect();
    let (lead, _) = labs
        .first()
        .ok_or_else(|| AppError::NotFound("no labs published".to_string()))?;
    let site = &state.catalog.config.site;
    let meta = metadata::labs_index_meta(&state.routes, site, lead);
    Ok(Html(
        render_labs_index(&state.routes, &labs, &meta, &site.name).into_string(),
    ))
}

async fn redirect_or_404(State(state): State<AppState>, uri: Uri) -> Response {
    match resolve_redirect(&state.catalog.config.redirects, uri.path(), uri.query()) {
        Some(redirect) => {
            let status = StatusCode::from_u16(redirect.status())
                .unwrap_or(StatusCode::TEMPORARY_REDIRECT);
            tracing::debug!(from = %uri, to = %redirect.location, "redirect");
            (status, [(header::LOCATION, redirect.location)]).into_response()
        }
        None => AppError::NotFound(format!("no route for {}", uri.path())).into_response(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn share_html(
    state: &AppState,
    slug: &str,
    score: Option<&str>,
    query: Option<&str>,
) -> Result<Html<String>, AppError> {
    let game = state.game(slug)?;
    let meta = metadata::share_page_meta(&state.routes, &state.catalog.config.site, game, score);
    // the request query is known here, even when it is empty
    let query = Some(query.unwrap_or_default());
    Ok(Html(
        render_share_page(&state.routes, game, &meta, query).into_string(),
    ))
}

async fn rasterize(state: AppState, slug: String, score: Option<String>) -> Result<Vec<u8>, AppError> {
    state.game(&slug)?;
    tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let game = state.game(&slug)?;
        let card = ShareCard::for_game(game, score.as_deref(), &state.catalog.config);
        Ok(render_share_png(&*state.backend, &card)?)
    })
    .await
    .map_err(|e| AppError::Internal(format!("render task failed: {e}")))?
}

fn png_response(png: Vec<u8>, cache_control: &'static str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, cache_control),
        ],
        png,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{FAKE_PNG, MockBackend, RecordedOp};
    use crate::test_helpers::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state_with(backend: Arc<MockBackend>) -> AppState {
        let content = setup_content();
        let catalog = crate::catalog::scan(content.path()).unwrap();
        AppState::new(catalog, backend).unwrap()
    }

    async fn get_uri(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[tokio::test]
    async fn score_image_renders_score_verbatim() {
        let backend = Arc::new(MockBackend::new());
        let app = build_app(state_with(backend.clone()));
        let resp = get_uri(app, "/pixelpit/arcade/beam/share/1234/opengraph-image").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], FAKE_PNG);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        let RecordedOp::Render { width, height, svg } = &ops[0];
        assert_eq!((*width, *height), (1200, 630));
        assert!(svg.contains(">1234</text>"));
    }

    #[tokio::test]
    async fn score_path_segment_is_decoded() {
        let backend = Arc::new(MockBackend::new());
        let app = build_app(state_with(backend.clone()));
        let resp = get_uri(app, "/pixelpit/arcade/beam/share/1%2C234/opengraph-image").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let RecordedOp::Render { svg, .. } = &backend.get_operations()[0];
        assert!(svg.contains(">1,234</text>"));
    }

    #[tokio::test]
    async fn card_image_has_no_score() {
        let backend = Arc::new(MockBackend::new());
        let app = build_app(state_with(backend.clone()));
        let resp = get_uri(app, "/pixelpit/arcade/beam/opengraph-image").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let RecordedOp::Render { svg, .. } = &backend.get_operations()[0];
        assert!(!svg.contains("I SCORED"));
    }

    #[tokio::test]
    async fn unknown_game_is_404_without_rendering() {
        let backend = Arc::new(MockBackend::new());
        let app = build_app(state_with(backend.clone()));
        let resp = get_uri(app, "/pixelpit/arcade/nope/share/1/opengraph-image").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(backend.render_count(), 0);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["error"], "unknown game 'nope'");
    }

    #[tokio::test]
    async fn render_failure_is_500() {
        let app = build_app(state_with(Arc::new(MockBackend::failing("boom"))));
        let resp = get_uri(app, "/pixelpit/arcade/beam/opengraph-image").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // =========================================================================
    // Pages
    // =========================================================================

    #[tokio::test]
    async fn share_page_has_score_metadata_and_forward() {
        let app = build_app(state_with(Arc::new(MockBackend::new())));
        let resp = get_uri(app, "/pixelpit/arcade/beam/share/1234?ref=x&utm_source=tw").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("<title>I scored 1234 on BEAM</title>"));
        assert!(html.contains(
            r#"content="https://pixelpit.gg/pixelpit/arcade/beam/share/1234/opengraph-image""#
        ));
        assert!(html.contains(r#"var target = "/pixelpit/arcade/beam?ref=x&utm_source=tw";"#));
    }

    #[tokio::test]
    async fn bare_share_page_degrades_to_card() {
        let app = build_app(state_with(Arc::new(MockBackend::new())));
        let html = body_string(get_uri(app, "/pixelpit/arcade/beam/share").await).await;
        assert!(html.contains("<title>BEAM | Pixelpit Arcade</title>"));
        assert!(html.contains(r#"content="https://pixelpit.gg/pixelpit/arcade/beam/opengraph-image""#));
        assert!(html.contains(r#"content="0; url=/pixelpit/arcade/beam""#));
    }

    #[tokio::test]
    async fn game_meta_is_json() {
        let app = build_app(state_with(Arc::new(MockBackend::new())));
        let resp = get_uri(app, "/pixelpit/arcade/beam/meta.json").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["canonical_url"], "https://pixelpit.gg/pixelpit/arcade/beam");
    }

    #[tokio::test]
    async fn lab_pages_render() {
        let state = state_with(Arc::new(MockBackend::new()));
        let resp = get_uri(build_app(state.clone()), "/pixelpit/arcade/beam/lab").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("class=\"transcript\""));

        let resp = get_uri(build_app(state), "/pixelpit/arcade/labs").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // =========================================================================
    // Redirects
    // =========================================================================

    #[tokio::test]
    async fn legacy_path_redirects_permanently_with_query() {
        let app = build_app(state_with(Arc::new(MockBackend::new())));
        let resp = get_uri(app, "/pp/beam/share/99?ref=abc&x=1").await;
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            resp.headers()[header::LOCATION],
            "/pixelpit/arcade/beam/share/99?ref=abc&x=1"
        );
    }

    #[tokio::test]
    async fn unmatched_path_is_404() {
        let app = build_app(state_with(Arc::new(MockBackend::new())));
        let resp = get_uri(app, "/somewhere/else").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
