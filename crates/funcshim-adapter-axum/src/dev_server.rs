use std::net::{SocketAddr, TcpListener as StdTcpListener};

use anyhow::Context;
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use tokio::runtime::Builder as RuntimeBuilder;
use tokio::signal;
use tower::{service_fn, Service};

use funcshim_core::app::Hooks;
use funcshim_core::manifest::{ManifestDev, ManifestLoader};
use funcshim_core::router::RouterService;

use crate::service::FuncShimAxumService;
use crate::LOGGING_SECTION;

#[derive(Clone, Debug)]
pub struct AxumDevServerConfig {
    pub addr: SocketAddr,
    pub enable_ctrl_c: bool,
}

impl Default for AxumDevServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            enable_ctrl_c: true,
        }
    }
}

impl AxumDevServerConfig {
    pub fn from_manifest(dev: &ManifestDev) -> anyhow::Result<Self> {
        Ok(Self {
            addr: dev.socket_addr()?,
            enable_ctrl_c: dev.ctrl_c(),
        })
    }
}

/// Blocking development server. Only started when the deployment binary runs directly.
pub struct AxumDevServer {
    router: RouterService,
    config: AxumDevServerConfig,
}

impl AxumDevServer {
    pub fn new(router: RouterService) -> Self {
        Self::with_config(router, AxumDevServerConfig::default())
    }

    pub fn with_config(router: RouterService, config: AxumDevServerConfig) -> Self {
        Self { router, config }
    }

    pub fn config(&self) -> &AxumDevServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until ctrl-c (when enabled).
    pub fn run(self) -> anyhow::Result<()> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;

        runtime.block_on(async move {
            // Bind with std first so an occupied port fails before the runtime spins up tasks.
            let listener = StdTcpListener::bind(self.config.addr)
                .with_context(|| format!("failed to bind dev server to {}", self.config.addr))?;
            listener
                .set_nonblocking(true)
                .context("failed to set listener to non-blocking")?;
            let listener =
                TcpListener::from_std(listener).context("failed to adopt std listener into tokio")?;
            self.serve(listener).await
        })
    }

    /// Serve on an already bound listener. Must run inside a multi-threaded Tokio runtime.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let AxumDevServer { router, config } = self;
        if let Ok(addr) = listener.local_addr() {
            info!("dev server listening on http://{}", addr);
        }

        let service = FuncShimAxumService::new(router);
        let app = Router::new().fallback_service(service_fn(move |req| {
            let mut svc = service.clone();
            async move { svc.call(req).await }
        }));
        let make_service = app.into_make_service_with_connect_info::<SocketAddr>();

        let server = axum::serve(listener, make_service);
        if config.enable_ctrl_c {
            server
                .with_graceful_shutdown(async {
                    let _ = signal::ctrl_c().await;
                })
                .await
                .context("axum server error")?;
        } else {
            server.await.context("axum server error")?;
        }
        Ok(())
    }
}

/// Resolve the manifest, build `A` and serve it until interrupted.
pub fn run_app<A: Hooks>(manifest_src: &str) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let loader = ManifestLoader::resolve(&cwd, manifest_src).context("failed to load manifest")?;
    let manifest = loader.manifest();
    manifest.logging_or_default(LOGGING_SECTION).init_logger();

    let config = AxumDevServerConfig::from_manifest(&manifest.dev)?;
    let app = A::build_app();
    info!("starting {} in development mode", app.name());
    AxumDevServer::with_config(app.router().clone(), config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcshim_core::context::RequestContext;
    use funcshim_core::error::ShimError;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::{Duration, Instant};

    #[test]
    fn default_config_listens_on_loopback() {
        let config = AxumDevServerConfig::default();
        assert_eq!(config.addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.addr.port(), 8787);
        assert!(config.enable_ctrl_c);
    }

    #[test]
    fn config_follows_manifest_dev_section() {
        let loader = ManifestLoader::load_from_str(
            "[dev]\nhost = \"0.0.0.0\"\nport = 5000\nctrl_c = false\n",
        )
        .unwrap();
        let config = AxumDevServerConfig::from_manifest(&loader.manifest().dev).unwrap();
        assert_eq!(config.addr, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert!(!config.enable_ctrl_c);

        let server = AxumDevServer::with_config(RouterService::builder().build(), config);
        assert_eq!(server.config().addr.port(), 5000);
    }

    async fn start(router: RouterService) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = AxumDevServer::with_config(
            router,
            AxumDevServerConfig {
                addr,
                enable_ctrl_c: false,
            },
        );
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        (format!("http://{addr}"), handle)
    }

    async fn get_with_retry(url: &str) -> reqwest::Response {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            match client.get(url).header("x-dev-check", "yes").send().await {
                Ok(response) => return response,
                Err(err) if Instant::now() >= deadline => {
                    panic!("server did not respond before timeout: {err}")
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn serves_routes_and_reports_peer_address() {
        async fn whoami(ctx: RequestContext) -> Result<String, ShimError> {
            let peer = crate::AxumRequestContext::get(ctx.request())
                .and_then(|ctx| ctx.remote_addr)
                .map(|addr| addr.ip().to_string())
                .unwrap_or_default();
            Ok(format!("{} {}", peer, ctx.header("x-dev-check").unwrap_or("-")))
        }

        let (base, handle) = start(RouterService::builder().get("/whoami", whoami).build()).await;

        let response = get_with_retry(&format!("{base}/whoami")).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "127.0.0.1 yes");

        let missing = get_with_retry(&format!("{base}/missing")).await;
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
        let payload: serde_json::Value =
            serde_json::from_str(&missing.text().await.unwrap()).unwrap();
        assert_eq!(payload["error"]["status"], 404);

        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_fails_when_port_is_taken() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = taken.local_addr().unwrap();
        let server = AxumDevServer::with_config(
            RouterService::builder().build(),
            AxumDevServerConfig {
                addr,
                enable_ctrl_c: false,
            },
        );

        let result = tokio::task::spawn_blocking(move || server.run())
            .await
            .expect("join");
        let err = result.expect_err("bind error");
        assert!(err.to_string().contains("failed to bind"), "{err}");
        drop(taken);
    }
}
