use crate::http::{Request, Response};
use crate::router::RouterService;

pub const DEFAULT_APP_NAME: &str = "FuncShim App";

/// The wrapped application: a named router that every adapter dispatches into.
pub struct App {
    router: RouterService,
    name: String,
}

impl App {
    pub fn with_name<S>(router: RouterService, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            router,
            name: name.into(),
        }
    }

    pub fn router(&self) -> &RouterService {
        &self.router
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one request through the application. Routing and handler failures come back as
    /// error responses, never as `Err`.
    pub async fn handle(&self, request: Request) -> Response {
        self.router.oneshot(request).await
    }
}

/// Implemented by an application crate so the adapters' `run_app` entry points can build it.
pub trait Hooks {
    fn routes() -> RouterService;

    fn name() -> &'static str {
        DEFAULT_APP_NAME
    }

    fn build_app() -> App
    where
        Self: Sized,
    {
        App::with_name(Self::routes(), Self::name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::context::RequestContext;
    use crate::error::ShimError;
    use crate::http::{request_builder, Method, StatusCode};
    use futures::executor::block_on;

    struct Named;

    impl Hooks for Named {
        fn routes() -> RouterService {
            async fn ping(_ctx: RequestContext) -> Result<&'static str, ShimError> {
                Ok("pong")
            }
            RouterService::builder().get("/ping", ping).build()
        }

        fn name() -> &'static str {
            "named-app"
        }
    }

    struct Bare;

    impl Hooks for Bare {
        fn routes() -> RouterService {
            RouterService::builder().build()
        }
    }

    fn get(uri: &str) -> Request {
        request_builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn build_app_uses_hook_name_and_routes() {
        let app = Named::build_app();
        assert_eq!(app.name(), "named-app");
        let response = block_on(app.handle(get("/ping")));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().buffered().unwrap().as_ref(), b"pong");
    }

    #[test]
    fn handle_turns_routing_errors_into_responses() {
        let app = Bare::build_app();
        assert_eq!(app.name(), DEFAULT_APP_NAME);
        let response = block_on(app.handle(get("/ping")));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
