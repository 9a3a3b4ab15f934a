use funcshim_core::app::Hooks;
use funcshim_core::middleware::RequestLogger;
use funcshim_core::router::RouterService;

use crate::generate::generate;
use crate::handlers::{echo, echo_json, headers, health, request_summary, root, stream};

pub struct DemoApp;

impl Hooks for DemoApp {
    fn routes() -> RouterService {
        build_router()
    }

    fn name() -> &'static str {
        "FuncShim Demo"
    }
}

pub fn build_router() -> RouterService {
    RouterService::builder()
        .middleware(RequestLogger)
        .enable_route_listing()
        .get("/", root)
        .get("/health", health)
        .get("/echo/{name}", echo)
        .post("/echo", echo_json)
        .get("/headers", headers)
        .get("/request", request_summary)
        .get("/stream", stream)
        .post("/generate", generate)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcshim_core::body::Body;
    use funcshim_core::http::{request_builder, Method, StatusCode};
    use funcshim_core::router::DEFAULT_ROUTE_LISTING_PATH;
    use futures::executor::block_on;

    fn get(path: &str) -> funcshim_core::http::Response {
        let app = DemoApp::build_app();
        let request = request_builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("request");
        block_on(app.handle(request))
    }

    #[test]
    fn app_carries_demo_name() {
        assert_eq!(DemoApp::build_app().name(), "FuncShim Demo");
    }

    #[test]
    fn route_listing_includes_every_route() {
        let response = get(DEFAULT_ROUTE_LISTING_PATH);
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = block_on(response.into_body().collect()).expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        let routes = payload.as_array().expect("array");
        for (method, path) in [
            ("GET", "/"),
            ("GET", "/health"),
            ("GET", "/echo/{name}"),
            ("POST", "/echo"),
            ("GET", "/request"),
            ("POST", "/generate"),
            ("GET", DEFAULT_ROUTE_LISTING_PATH),
        ] {
            assert!(
                routes
                    .iter()
                    .any(|entry| entry["method"] == method && entry["path"] == path),
                "missing {method} {path}"
            );
        }
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(get("/nope").status(), StatusCode::NOT_FOUND);
    }
}
