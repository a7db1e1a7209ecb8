//! HTTP server rendering pages on request
//!
//! Every request loads fresh content from the collection's source; nothing is
//! cached between requests. Dropping a request (client disconnect) drops its
//! in-flight fetches.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::ContentId;
use crate::helpers::{collection_url, item_url};
use crate::lister::{ListingState, LoadFailure};
use crate::pages::{PageStatus, Pages, RenderedPage};
use crate::Site;

/// Server state
struct ServerState {
    pages: Pages,
}

#[derive(Debug, Deserialize)]
struct DetailQuery {
    image: Option<String>,
}

/// Build the application router
pub fn router(site: Site) -> Result<Router> {
    let static_dir = site.static_dir.clone();
    let state = Arc::new(ServerState {
        pages: Pages::new(site)?,
    });

    Ok(Router::new()
        .route("/", get(home_handler))
        .route("/schedule", get(schedule_handler))
        .route("/:collection", get(listing_handler))
        .route("/:collection/page/:page", get(listing_page_handler))
        .route("/:collection/:id", get(detail_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16, open: bool) -> Result<()> {
    let app = router(site.clone())?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Turn a rendered page into a response with the matching status code
fn respond(page: Result<RenderedPage>) -> Response {
    match page {
        Ok(page) => {
            let status = match page.status {
                PageStatus::Ok => StatusCode::OK,
                PageStatus::NotFound => StatusCode::NOT_FOUND,
                PageStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Html(page.html)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to render page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// `/` shows the first collection
async fn home_handler(State(state): State<Arc<ServerState>>) -> Response {
    let site = state.pages.site();
    match site.config.collections.keys().next() {
        Some(name) => Redirect::to(&collection_url(&site.config, name)).into_response(),
        None => respond(state.pages.not_found(&state.pages.back_home(), None)),
    }
}

/// `/schedule` sends visitors to the booking page
async fn schedule_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.pages.site().scheduler.booking_url() {
        Some(url) => Redirect::temporary(url.as_str()).into_response(),
        None => respond(state.pages.not_found(&state.pages.back_home(), None)),
    }
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    Path(collection): Path<String>,
) -> Response {
    render_listing(&state, &collection, 1).await
}

async fn listing_page_handler(
    State(state): State<Arc<ServerState>>,
    Path((collection, page)): Path<(String, String)>,
) -> Response {
    match page.parse::<usize>() {
        Ok(page) => render_listing(&state, &collection, page).await,
        Err(_) => respond(
            state
                .pages
                .not_found(&state.pages.back_to(&collection), Some(&collection)),
        ),
    }
}

async fn render_listing(state: &ServerState, collection: &str, page: usize) -> Response {
    let pages = &state.pages;
    if pages.site().config.collection(collection).is_none() {
        return respond(pages.not_found(&pages.back_home(), None));
    }

    let listing = match pages.site().lister(collection) {
        Ok(lister) => lister.load().await,
        Err(e) => {
            tracing::error!("Failed to open {}: {:#}", collection, e);
            ListingState::Failed(LoadFailure {
                message: e.to_string(),
                retryable: false,
            })
        }
    };
    respond(pages.listing(collection, &listing, page))
}

async fn detail_handler(
    State(state): State<Arc<ServerState>>,
    Path((collection, raw_id)): Path<(String, String)>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let pages = &state.pages;
    let site = pages.site();
    if site.config.collection(&collection).is_none() {
        return respond(pages.not_found(&pages.back_home(), None));
    }

    let id: ContentId = match raw_id.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    };
    let image = query
        .image
        .as_deref()
        .and_then(|i| i.parse::<i64>().ok())
        .unwrap_or(0);
    let page_url = item_url(&site.config, &collection, &id);

    let lister = match site.lister(&collection) {
        Ok(lister) => lister,
        Err(e) => {
            tracing::error!("Failed to open {}: {:#}", collection, e);
            let failure = LoadFailure {
                message: e.to_string(),
                retryable: false,
            };
            return respond(pages.failed(
                &failure,
                &page_url,
                Some(pages.back_to(&collection)),
                Some(&collection),
            ));
        }
    };
    let renderer = match site.detail_renderer(&collection, &lister) {
        Ok(renderer) => renderer,
        Err(e) => return respond(Err(e)),
    };

    let (detail, listing) = tokio::join!(lister.load_detail(&id), lister.load());
    let related = match listing {
        ListingState::Loaded(listing) => pages.related_cards(&collection, &listing, &id),
        ListingState::Failed(failure) => {
            tracing::warn!(
                "Showing {} without related items: {}",
                id,
                failure.message
            );
            Vec::new()
        }
        _ => Vec::new(),
    };

    respond(pages.detail(&collection, renderer.view(detail, image), related, &page_url))
}

async fn fallback_handler(State(state): State<Arc<ServerState>>) -> Response {
    respond(state.pages.not_found(&state.pages.back_home(), None))
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ITEMS: &str = r#"
- id: 1
  title: Saving for retirement
  content: "Start early.\n\n- Pensions\n- ISAs"
  publishedAt: "2024-01-01"
- id: 2
  title: Tax season checklist
  content: "<p>Gather your <strong>receipts</strong><script>alert(1)</script></p>"
  publishedAt: "2024-06-01"
  images:
    - https://cdn.example.com/a.jpg
    - https://cdn.example.com/b.jpg
"#;

    fn site_dir(extra: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            format!(
                "title: Acme Advisory\nscheduling:\n  url: https://calendly.com/acme\ncollections:\n  blog:\n    title: Blog\n    source:\n      kind: file\n      path: blog.yml\n{}",
                extra
            ),
        )
        .unwrap();
        fs::write(dir.path().join("blog.yml"), ITEMS).unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/style.css"), "body {}").unwrap();
        dir
    }

    async fn serve(dir: &TempDir) -> String {
        let site = Site::new(dir.path()).unwrap();
        let app = router(site).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_home_redirects_to_first_collection() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client().get(format!("{}/", base)).send().await.unwrap();
        assert!(resp.status().is_redirection());
        assert_eq!(resp.headers()["location"], "/blog");
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client().get(format!("{}/blog", base)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = resp.text().await.unwrap();
        let newer = html.find("Tax season checklist").unwrap();
        let older = html.find("Saving for retirement").unwrap();
        assert!(newer < older);
        assert!(html.contains("https://cdn.example.com/a.jpg"));
    }

    #[tokio::test]
    async fn test_detail_page() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client()
            .get(format!("{}/blog/2?image=1", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = resp.text().await.unwrap();
        assert!(html.contains("<strong>receipts</strong>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("2 / 2"));
        // The older post is listed as related.
        assert!(html.contains("Saving for retirement"));
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client().get(format!("{}/blog/99", base)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let html = resp.text().await.unwrap();
        assert!(html.contains("href=\"/blog\""));
    }

    #[tokio::test]
    async fn test_unknown_collection_is_not_found() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client().get(format!("{}/nope", base)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_schedule_redirects_to_booking() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client()
            .get(format!("{}/schedule", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()["location"], "https://calendly.com/acme");
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let dir = site_dir("");
        let base = serve(&dir).await;
        let resp = client()
            .get(format!("{}/static/style.css", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text().await.unwrap(), "body {}");
    }

    #[tokio::test]
    async fn test_backend_failure_is_unavailable() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&backend)
            .await;

        let dir = site_dir(&format!(
            "  events:\n    title: Events\n    source:\n      kind: rest\n      base_url: {}/events\n",
            backend.uri()
        ));
        let base = serve(&dir).await;
        let resp = client().get(format!("{}/events", base)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = resp.text().await.unwrap();
        assert!(html.contains("Try again"));
        assert!(html.contains("href=\"/events\""));
    }
}
