//! HTTP transport for crawls
//!
//! - `GET /crawl?url=...` returns the sitemap tree as JSON
//! - `GET /` serves an HTML form; `GET /?url=...` renders the crawled URLs
//!
//! Crawl depth for HTTP requests is fixed by configuration. A client that
//! disconnects drops its handler future, which aborts the crawl's tasks.

use crate::config::ServerConfig;
use crate::crawler::Crawler;
use crate::{ConfigError, SumiError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct AppState {
    crawler: Arc<Crawler>,
    depth: u32,
}

#[derive(Debug, Deserialize)]
struct CrawlParams {
    url: Option<String>,
}

impl CrawlParams {
    fn start_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Builds the application router
pub fn router(crawler: Crawler, depth: u32) -> Router {
    let state = AppState {
        crawler: Arc::new(crawler),
        depth,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/crawl", get(crawl_handler))
        .with_state(state)
}

/// Serves the router on `config.bind` until `shutdown` fires
///
/// In-flight requests are allowed to finish after shutdown is requested.
pub async fn serve(
    crawler: Crawler,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), SumiError> {
    let addr: SocketAddr = config.bind.parse().map_err(|e| {
        ConfigError::Validation(format!("server.bind '{}' is not a socket address: {}", config.bind, e))
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", listener.local_addr()?);
    tracing::info!("Crawl depth for requests: {}", config.crawl_depth);

    axum::serve(listener, router(crawler, config.crawl_depth))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// JSON crawl endpoint
async fn crawl_handler(State(state): State<AppState>, Query(params): Query<CrawlParams>) -> Response {
    let Some(start_url) = params.start_url() else {
        tracing::warn!("Missing url parameter");
        return (StatusCode::BAD_REQUEST, "url parameter is required").into_response();
    };

    let started = Instant::now();
    tracing::info!(url = %start_url, depth = state.depth, "crawl requested");

    match state.crawler.crawl(start_url, state.depth).await {
        Ok(tree) => {
            tracing::info!(url = %start_url, "Crawling completed in {:?}", started.elapsed());
            Json(tree).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// HTML front-end
async fn index_handler(State(state): State<AppState>, Query(params): Query<CrawlParams>) -> Response {
    let Some(start_url) = params.start_url() else {
        return Html(render_page("", None, &[])).into_response();
    };

    match state.crawler.crawl(start_url, state.depth).await {
        Ok(tree) => Html(render_page(start_url, None, &tree.urls())).into_response(),
        Err(e) => {
            let body = render_page(start_url, Some(&e.to_string()), &[]);
            (StatusCode::BAD_REQUEST, Html(body)).into_response()
        }
    }
}

fn render_page(url: &str, error: Option<&str>, urls: &[&str]) -> String {
    let mut page = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sitemap Crawler</title>
    <style>
        body { font-family: Arial, sans-serif; padding: 20px; }
        h1 { text-align: center; }
        input, button { padding: 10px; margin: 10px; width: 300px; }
        pre { background-color: #f4f4f4; padding: 10px; }
    </style>
</head>
<body>
    <h1>Sitemap Crawler</h1>
    <form action="/" method="get">
        <label for="url">Enter URL to crawl:</label><br>
"#,
    );

    page.push_str(&format!(
        "        <input type=\"text\" id=\"url\" name=\"url\" value=\"{}\" required>\n",
        html_escape::encode_double_quoted_attribute(url)
    ));
    page.push_str("        <button type=\"submit\">Start Crawling</button>\n    </form>\n");

    if let Some(error) = error {
        page.push_str(&format!(
            "    <div style=\"color: red;\">Error: {}</div>\n",
            html_escape::encode_text(error)
        ));
    }

    if !urls.is_empty() {
        page.push_str("    <h3>Crawled URLs:</h3>\n    <pre>");
        for url in urls {
            page.push_str(&html_escape::encode_text(url));
            page.push('\n');
        }
        page.push_str("</pre>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}
