use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::task::{Context, Poll};

use matchit::Router as PathRouter;
use serde::Serialize;
use tower_service::Service;

use crate::context::RequestContext;
use crate::error::ShimError;
use crate::handler::{BoxHandler, IntoHandler};
use crate::http::{HandlerFuture, Method, Request, Response};
use crate::middleware::{BoxMiddleware, Middleware, Next};
use crate::params::PathParams;
use crate::response::{IntoResponse, Json};

pub const DEFAULT_ROUTE_LISTING_PATH: &str = "/__funcshim/routes";

#[derive(Clone, Debug, Serialize)]
pub struct RouteInfo {
    #[serde(serialize_with = "serialize_method")]
    method: Method,
    path: String,
}

fn serialize_method<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(method.as_str())
}

impl RouteInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Default)]
pub struct RouterBuilder {
    routes: HashMap<Method, PathRouter<BoxHandler>>,
    middlewares: Vec<BoxMiddleware>,
    route_info: Vec<RouteInfo>,
    route_listing: bool,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a JSON listing of every registered route at [`DEFAULT_ROUTE_LISTING_PATH`].
    pub fn enable_route_listing(mut self) -> Self {
        self.route_listing = true;
        self
    }

    /// Register `handler` for `method` requests on `path`.
    ///
    /// # Panics
    /// When the same method and path pattern is registered twice.
    pub fn route<H>(mut self, path: &str, method: Method, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.insert(path, method, handler.into_handler());
        self
    }

    pub fn get<H>(self, path: &str, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.route(path, Method::GET, handler)
    }

    pub fn post<H>(self, path: &str, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.route(path, Method::POST, handler)
    }

    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(mut self) -> RouterService {
        if self.route_listing {
            let path = DEFAULT_ROUTE_LISTING_PATH;
            self.route_info.push(RouteInfo::new(Method::GET, path));
            let index = Arc::new(self.route_info.clone());
            let listing = move |_ctx: RequestContext| {
                let index = Arc::clone(&index);
                async move { Ok::<_, ShimError>(Json(index.as_ref().clone())) }
            };
            // Registered directly so the listing entry is not recorded twice.
            Self::insert_handler(&mut self.routes, path, Method::GET, listing.into_handler());
        }

        RouterService {
            inner: Arc::new(RouterInner {
                routes: self.routes,
                middlewares: self.middlewares,
                route_index: self.route_info,
            }),
        }
    }

    fn insert(&mut self, path: &str, method: Method, handler: BoxHandler) {
        Self::insert_handler(&mut self.routes, path, method.clone(), handler);
        self.route_info.push(RouteInfo::new(method, path));
    }

    fn insert_handler(
        routes: &mut HashMap<Method, PathRouter<BoxHandler>>,
        path: &str,
        method: Method,
        handler: BoxHandler,
    ) {
        routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|err| panic!("duplicate route definition for {}: {}", path, err));
    }
}

/// Cloneable tower service dispatching requests to the registered handlers.
#[derive(Clone)]
pub struct RouterService {
    inner: Arc<RouterInner>,
}

impl RouterService {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.inner.route_index
    }

    /// Dispatch a request and render any routing or handler error as a response.
    pub async fn oneshot(&self, request: Request) -> Response {
        match self.inner.dispatch(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

struct RouterInner {
    routes: HashMap<Method, PathRouter<BoxHandler>>,
    middlewares: Vec<BoxMiddleware>,
    route_index: Vec<RouteInfo>,
}

enum RouteMatch<'a> {
    Found(&'a BoxHandler, PathParams),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl RouterInner {
    async fn dispatch(&self, request: Request) -> Result<Response, ShimError> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.find_route(&method, &path) {
            RouteMatch::Found(handler, params) => {
                let ctx = RequestContext::new(request, params);
                Next::new(&self.middlewares, handler.as_ref())
                    .run(ctx)
                    .await
            }
            RouteMatch::MethodNotAllowed(allowed) => {
                Err(ShimError::method_not_allowed(&method, &allowed))
            }
            RouteMatch::NotFound => Err(ShimError::not_found(path)),
        }
    }

    fn find_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        if let Some(matched) = self
            .routes
            .get(method)
            .and_then(|router| router.at(path).ok())
        {
            let params = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            return RouteMatch::Found(matched.value, params);
        }

        let allowed: BTreeSet<&str> = self
            .routes
            .iter()
            .filter(|(_, router)| router.at(path).is_ok())
            .map(|(candidate, _)| candidate.as_str())
            .collect();

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(
                allowed
                    .into_iter()
                    .filter_map(|name| Method::from_bytes(name.as_bytes()).ok())
                    .collect(),
            )
        }
    }
}

impl Service<Request> for RouterService {
    type Response = Response;
    type Error = ShimError;
    type Future = HandlerFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.dispatch(request).await })
    }
}
