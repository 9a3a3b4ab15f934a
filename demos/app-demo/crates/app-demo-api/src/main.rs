mod args;

use std::io::Read;
use std::net::ToSocketAddrs;
use std::path::Path;

use anyhow::{anyhow, Context};
use app_demo_api::{app, handle_event, MANIFEST};
use app_demo_core::DemoApp;
use clap::Parser;
use funcshim_adapter_axum::{AxumDevServer, AxumDevServerConfig};
use funcshim_adapter_serverless::runtime::RUNTIME_API_ENV;
use funcshim_adapter_serverless::InvocationContext;
use funcshim_core::manifest::ManifestLoader;
use log::info;

use args::{Args, Command};

fn main() {
    let runtime_api_set = std::env::var_os(RUNTIME_API_ENV).is_some();
    let command = Args::parse().command(runtime_api_set);
    if let Err(err) = run(command) {
        eprintln!("app-demo-api failed: {err:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { host, port } => serve(host, port),
        Command::Invoke { event, pretty } => invoke(event.as_deref(), pretty),
        Command::Runtime => funcshim_adapter_serverless::run_app::<DemoApp>(MANIFEST),
    }
}

fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if host.is_none() && port.is_none() {
        return funcshim_adapter_axum::run_app::<DemoApp>(MANIFEST);
    }

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let loader = ManifestLoader::resolve(&cwd, MANIFEST).context("failed to load manifest")?;
    let manifest = loader.manifest();
    manifest
        .logging_or_default(funcshim_adapter_axum::LOGGING_SECTION)
        .init_logger();

    let mut config = AxumDevServerConfig::from_manifest(&manifest.dev)?;
    let target = format!(
        "{}:{}",
        host.as_deref().unwrap_or(manifest.dev.host()),
        port.unwrap_or(manifest.dev.port())
    );
    config.addr = target
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| anyhow!("dev server address `{target}` could not be resolved"))?;
    if let Some(root) = manifest.root() {
        info!("project root {}", root.display());
    }

    AxumDevServer::with_config(app().router().clone(), config).run()
}

fn invoke(event: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let payload = match event {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read event {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read event from stdin")?;
            buf
        }
    };

    let context = InvocationContext::new(format!("local-{}", std::process::id()));
    let response = futures::executor::block_on(handle_event(&payload, &context))?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{rendered}");
    Ok(())
}
