//! Local replay server (§4.15, §6): serves the files a [`crate::report::FileReportSink`]
//! already wrote to `output_dir`, so a crawl's output can be browsed without
//! re-running anything. Routing/middleware layering follows the teacher's
//! registry API server (`axum::Router`, one handler per route, state
//! threaded via `State`).

use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
struct AppState {
    output_dir: Arc<PathBuf>,
}

/// Build the router for `output_dir`, independent of binding so tests can
/// drive it with `tower::ServiceExt::oneshot`.
pub fn build_router(output_dir: PathBuf) -> Router {
    let state = AppState { output_dir: Arc::new(output_dir) };
    Router::new()
        .route("/", get(index))
        .route("/states/:id", get(state_page))
        .route("/states/:id/fields", get(state_fields))
        .route("/violations", get(violations))
        .with_state(state)
}

/// Bind `addr` and serve until the process is killed.
pub async fn serve(output_dir: PathBuf, addr: SocketAddr) -> anyhow::Result<()> {
    let router = build_router(output_dir);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "replay server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Response {
    let states_dir = crate::report::states_dir(&state.output_dir);
    let mut ids = Vec::new();
    if let Ok(entries) = std::fs::read_dir(&states_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(id) = name.strip_prefix("state-").and_then(|s| s.strip_suffix(".html")) {
                ids.push(id.to_string());
            }
        }
    }
    ids.sort();

    let mut body = String::from("<html><body><h1>demodocus replay</h1><ul>");
    for id in &ids {
        body.push_str(&format!(r#"<li><a href="/states/{id}">state {id}</a> (<a href="/states/{id}/fields">fields</a>)</li>"#));
    }
    body.push_str(r#"</ul><p><a href="/violations">violations</a></p></body></html>"#);
    Html(body).into_response()
}

async fn state_page(State(state): State<AppState>, AxumPath(id): AxumPath<u64>) -> Response {
    let path = crate::report::states_dir(&state.output_dir).join(format!("state-{id}.html"));
    match std::fs::read_to_string(&path) {
        Ok(contents) => Html(contents).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, format!("no such state: {id}")).into_response(),
    }
}

async fn state_fields(State(state): State<AppState>, AxumPath(id): AxumPath<u64>) -> Response {
    let path = crate::report::states_dir(&state.output_dir).join(format!("state-fields-{id}.json"));
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(value) => Json(value).into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "malformed state fields file").into_response(),
        },
        Err(_) => (StatusCode::NOT_FOUND, format!("no fields for state: {id}")).into_response(),
    }
}

async fn violations(State(state): State<AppState>) -> Response {
    let path = state.output_dir.join("violations.json");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(value) => Json(value).into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "malformed violations file").into_response(),
        },
        Err(_) => (StatusCode::NOT_FOUND, "no violations report written yet").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn root_serves_links_to_every_state() {
        let dir = tempfile::tempdir().unwrap();
        let states_dir = dir.path().join("states");
        std::fs::create_dir_all(&states_dir).unwrap();
        std::fs::write(states_dir.join("state-0.html"), "<html>zero</html>").unwrap();

        let router = build_router(dir.path().to_path_buf());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_state_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(crate::report::states_dir(dir.path())).unwrap();
        let router = build_router(dir.path().to_path_buf());
        let request = Request::builder().uri("/states/9").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn violations_file_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("violations.json"), r#"{"0":{"src":null,"violations":[]}}"#).unwrap();
        let router = build_router(dir.path().to_path_buf());
        let request = Request::builder().uri("/violations").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
