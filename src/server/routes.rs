//! HTTP routing for the viewer: the dashboard assets and the live stream.
use super::queue::OutboundQueue;
use super::stream::stream_response;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use rust_embed::RustEmbed;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Shared state of every request handled by one running server.
#[derive(Clone)]
pub struct ViewerState {
    pub queue: Arc<OutboundQueue>,
    pub shutdown: watch::Receiver<bool>,
    pub keepalive_interval: Duration,
}

/// What a normalized request path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Stylesheet,
    Script,
    LiveStream,
    NotFound,
}

impl Route {
    /// Resolves a request path. Matching ignores case.
    pub fn resolve(path: &str) -> Self {
        match path.to_ascii_lowercase().as_str() {
            "/" | "/index.html" | "/index.htm" => Route::Dashboard,
            "/style.css" => Route::Stylesheet,
            "/app.js" => Route::Script,
            "/logs" => Route::LiveStream,
            _ => Route::NotFound,
        }
    }
}

/// Builds the viewer's router.
pub fn router(state: ViewerState) -> Router {
    Router::new()
        .fallback(handle_request)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn handle_request(State(state): State<ViewerState>, uri: Uri) -> Response {
    match Route::resolve(uri.path()) {
        Route::Dashboard => serve_asset("index.html", "text/html; charset=utf-8"),
        Route::Stylesheet => serve_asset("style.css", "text/css; charset=utf-8"),
        Route::Script => serve_asset("app.js", "application/javascript; charset=utf-8"),
        Route::LiveStream => {
            stream_response(state.queue, state.shutdown, state.keepalive_interval)
        }
        Route::NotFound => not_found(),
    }
}

fn serve_asset(path: &str, content_type: &'static str) -> Response {
    match Assets::get(path) {
        Some(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            content.data.into_owned(),
        )
            .into_response(),
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "404 - Not Found: The requested resource does not exist.",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use futures::StreamExt;
    use tower::ServiceExt;

    fn test_router() -> (Router, Arc<OutboundQueue>, watch::Sender<bool>) {
        let queue = Arc::new(OutboundQueue::new());
        let (tx, rx) = watch::channel(false);
        let router = router(ViewerState {
            queue: queue.clone(),
            shutdown: rx,
            keepalive_interval: Duration::from_secs(10),
        });
        (router, queue, tx)
    }

    async fn get(router: Router, path: &str) -> Response {
        router
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    #[test]
    fn test_route_resolution() {
        assert_eq!(Route::resolve("/"), Route::Dashboard);
        assert_eq!(Route::resolve("/INDEX.HTML"), Route::Dashboard);
        assert_eq!(Route::resolve("/style.css"), Route::Stylesheet);
        assert_eq!(Route::resolve("/App.js"), Route::Script);
        assert_eq!(Route::resolve("/logs"), Route::LiveStream);
        assert_eq!(Route::resolve("/favicon.ico"), Route::NotFound);
    }

    #[tokio::test]
    async fn test_static_assets_have_content_types() {
        let (router, _, _tx) = test_router();

        let page = get(router.clone(), "/").await;
        assert_eq!(page.status(), StatusCode::OK);
        assert!(content_type(&page).starts_with("text/html"));

        let css = get(router.clone(), "/style.css").await;
        assert!(content_type(&css).starts_with("text/css"));

        let js = get(router, "/app.js").await;
        assert!(content_type(&js).starts_with("application/javascript"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (router, _, _tx) = test_router();
        let response = get(router, "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(content_type(&response).starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_logs_endpoint_streams_events() {
        let (router, queue, _tx) = test_router();
        queue.push("{\"Message\":\"queued\"}".to_string());

        let response = get(router, "/logs").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let mut body = response.into_body().into_data_stream();
        let first = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            String::from_utf8(first.to_vec()).unwrap(),
            "event: open\n\ndata: {\"Message\":\"queued\"}\n\n"
        );
    }
}
