use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body as AxumBody;
use axum::http::{Request, Response};
use tokio::{runtime::Handle, task};
use tower::Service;

use funcshim_core::router::RouterService;

use crate::request::into_core_request;
use crate::response::into_axum_response;

/// Tower service running a FuncShim router behind Axum/Hyper.
///
/// Router futures are not `Send`, so each request is driven to completion on the current
/// worker with `block_in_place`; this needs the multi-threaded Tokio runtime.
#[derive(Clone)]
pub struct FuncShimAxumService {
    router: RouterService,
}

impl FuncShimAxumService {
    pub fn new(router: RouterService) -> Self {
        Self { router }
    }
}

impl Service<Request<AxumBody>> for FuncShimAxumService {
    type Response = Response<AxumBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<AxumBody>) -> Self::Future {
        let router = self.router.clone();
        Box::pin(async move {
            let core_request = match into_core_request(request).await {
                Ok(request) => request,
                Err(err) => {
                    let mut response = Response::new(AxumBody::from(err.message()));
                    *response.status_mut() = err.status();
                    return Ok(response);
                }
            };

            let response = task::block_in_place(move || {
                Handle::current().block_on(async move {
                    into_axum_response(router.oneshot(core_request).await).await
                })
            });
            Ok(response)
        })
    }
}
