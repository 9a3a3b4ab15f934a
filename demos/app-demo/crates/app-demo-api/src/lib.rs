//! Deployment entry point for the demo application.
//!
//! The platform imports this library and calls [`handler`] once per invocation. Nothing here
//! binds a socket: the development server and the runtime API loop are only started by the
//! `app-demo-api` binary.

use app_demo_core::DemoApp;
use funcshim_adapter_serverless::{
    dispatch_event, handle, InvocationContext, InvocationError, InvocationRequest,
    InvocationResponse,
};
use funcshim_core::app::{App, Hooks};
use once_cell::sync::OnceCell;

/// Manifest baked into the artifact so the function starts from any working directory.
pub const MANIFEST: &str = include_str!("../../../funcshim.toml");

static APP: OnceCell<App> = OnceCell::new();

/// The wrapped application, built on first use.
pub fn app() -> &'static App {
    APP.get_or_init(DemoApp::build_app)
}

/// Platform adapter function.
pub async fn handler(
    request: InvocationRequest,
    context: &InvocationContext,
) -> Result<InvocationResponse, InvocationError> {
    handle(app(), request, context).await
}

/// Same as [`handler`], for a raw platform event payload.
pub async fn handle_event(
    payload: &[u8],
    context: &InvocationContext,
) -> Result<InvocationResponse, InvocationError> {
    dispatch_event(app(), payload, context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use funcshim_core::http::{request_builder, Method};
    use funcshim_core::manifest::ManifestLoader;
    use futures::executor::block_on;
    use serde_json::{json, Value};

    fn context() -> InvocationContext {
        InvocationContext::new("test")
    }

    #[test]
    fn embedded_manifest_is_valid() {
        let loader = ManifestLoader::load_from_str(MANIFEST).expect("manifest");
        let manifest = loader.manifest();
        assert_eq!(manifest.app_name(), Some("FuncShim Demo"));
        assert_eq!(manifest.function.name.as_deref(), Some("app-demo-api"));
    }

    #[test]
    fn app_is_built_once() {
        assert!(std::ptr::eq(app(), app()));
        assert_eq!(app().name(), "FuncShim Demo");
    }

    #[test]
    fn handler_passes_the_application_response_through() {
        let direct = block_on(async {
            let request = request_builder()
                .method(Method::GET)
                .uri("/echo/ada")
                .body(Default::default())
                .unwrap();
            funcshim_adapter_serverless::from_core_response(app().handle(request).await)
                .await
                .unwrap()
        });
        let adapted =
            block_on(handler(InvocationRequest::new("GET", "/echo/ada"), &context())).unwrap();
        assert_eq!(adapted, direct);
        assert_eq!(adapted.body, "Hello, ada!");
    }

    #[test]
    fn json_posts_and_validation_errors_round_trip() {
        let ok = block_on(handler(
            InvocationRequest::new("POST", "/echo")
                .with_header("content-type", "application/json")
                .with_body(r#"{"name":"platform"}"#),
            &context(),
        ))
        .unwrap();
        assert_eq!(ok.status_code, 200);
        assert_eq!(ok.body, "Hello, platform!");

        let rejected = block_on(handler(
            InvocationRequest::new("POST", "/echo")
                .with_header("content-type", "application/json")
                .with_base64_body(STANDARD.encode(r#"{"name":""}"#)),
            &context(),
        ))
        .unwrap();
        assert_eq!(rejected.status_code, 422);
    }

    #[test]
    fn request_summary_reflects_forwarding_headers() {
        let inner = InvocationRequest::new("GET", "/request?trace=1")
            .with_host("demo.example")
            .with_header("x-forwarded-for", "203.0.113.1");
        let payload = json!({
            "Action": "Invoke",
            "body": serde_json::to_string(&inner).unwrap(),
        })
        .to_string();

        let response = block_on(handle_event(payload.as_bytes(), &context())).unwrap();
        let summary: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(summary["path"], "/request");
        assert_eq!(summary["query"], "trace=1");
        assert_eq!(summary["headers"]["host"], "demo.example");
        assert_eq!(summary["headers"]["x-forwarded-for"], "203.0.113.1");
        assert_eq!(summary["environ"]["REQUEST_METHOD"], "GET");
        assert_eq!(summary["environ"]["QUERY_STRING"], "trace=1");
        assert_eq!(summary["environ"]["SERVER_NAME"], "demo.example");
        assert_eq!(summary["environ"]["REMOTE_ADDR"], "203.0.113.1");
    }

    fn generate(body: Value) -> InvocationResponse {
        block_on(handler(
            InvocationRequest::new("POST", "/generate")
                .with_header("content-type", "application/json")
                .with_body(body.to_string()),
            &context(),
        ))
        .expect("response")
    }

    #[test]
    fn generate_returns_copy_for_valid_requests() {
        let response = generate(json!({"style1": "悬疑", "count1": 8}));
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        let reply: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(reply["success"], true);
        assert_eq!(reply["主体文案"]["风格"], "悬疑");
        assert_eq!(reply["主体文案"]["工具数量"], 8);
        assert_eq!(reply["主体文案"]["选中工具"].as_array().map(Vec::len), Some(8));
        assert_eq!(reply["热门标题"].as_array().map(Vec::len), Some(3));
        assert_eq!(reply["配图建议"].as_array().map(Vec::len), Some(3));
        assert!(reply["生成时间"].as_str().is_some_and(|at| at.len() == 19));

        let again = generate(json!({"style1": "悬疑", "count1": 8}));
        let again: Value = serde_json::from_str(&again.body).unwrap();
        assert_eq!(again["主体文案"], reply["主体文案"]);
        assert_eq!(again["热门标题"], reply["热门标题"]);
    }

    #[test]
    fn generate_reports_invalid_input_in_the_reply() {
        for body in [
            json!({"style1": "悬疑", "count1": 5}),
            json!({"style1": "悬疑", "count1": 16}),
            json!({"style1": "", "count1": 8}),
            json!({"count1": 8}),
        ] {
            let response = generate(body.clone());
            assert_eq!(response.status_code, 200, "{body}");
            let reply: Value = serde_json::from_str(&response.body).unwrap();
            assert_eq!(reply["success"], false, "{body}");
            assert!(reply["error"].as_str().is_some_and(|e| !e.is_empty()), "{body}");
        }

        let response = block_on(handler(
            InvocationRequest::new("POST", "/generate").with_body("not json"),
            &context(),
        ))
        .unwrap();
        let reply: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(reply["success"], false);

        let response =
            block_on(handler(InvocationRequest::new("GET", "/generate"), &context())).unwrap();
        assert_eq!(response.status_code, 405);
    }

    #[test]
    fn streamed_responses_are_buffered_for_the_platform() {
        let response =
            block_on(handler(InvocationRequest::new("GET", "/stream"), &context())).unwrap();
        assert_eq!(
            response.body,
            "chunk 0\nchunk 1\nchunk 2\nchunk 3\nchunk 4\n"
        );
    }
}
