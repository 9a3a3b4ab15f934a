//! Project manifest (`funcshim.toml`) and project-root resolution.
//!
//! Deployments embed the manifest at compile time so the function starts no matter which
//! directory the platform launches it from. During development a manifest found by walking up
//! from the working directory, or named by `FUNCSHIM_MANIFEST`, takes precedence and marks the
//! project root.

use std::collections::BTreeMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::LevelFilter;
use simple_logger::SimpleLogger;
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

pub const MANIFEST_FILE: &str = "funcshim.toml";
pub const MANIFEST_ENV: &str = "FUNCSHIM_MANIFEST";

const DEFAULT_DEV_HOST: &str = "127.0.0.1";
const DEFAULT_DEV_PORT: u16 = 8787;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("manifest failed validation: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("dev server address `{0}` could not be resolved")]
    Address(String),
}

pub struct ManifestLoader {
    manifest: Arc<Manifest>,
}

impl ManifestLoader {
    pub fn load_from_str(contents: &str) -> Result<Self, ManifestError> {
        Self::parse(contents, None)
    }

    /// Load a manifest file; its directory becomes the project root.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cwd = std::env::current_dir().map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, Some(resolve_root_path(path, &cwd)))
    }

    /// Resolve the manifest for a process starting in `start`, honouring `FUNCSHIM_MANIFEST`.
    pub fn resolve(start: &Path, embedded: &str) -> Result<Self, ManifestError> {
        let explicit = std::env::var_os(MANIFEST_ENV).map(PathBuf::from);
        Self::resolve_with(explicit.as_deref(), start, embedded)
    }

    /// Precedence: explicit path, then the nearest `funcshim.toml` above `start`, then the
    /// embedded copy.
    pub fn resolve_with(
        explicit: Option<&Path>,
        start: &Path,
        embedded: &str,
    ) -> Result<Self, ManifestError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match Self::discover(start)? {
            Some(loader) => Ok(loader),
            None => Self::load_from_str(embedded),
        }
    }

    /// Load the nearest `funcshim.toml` at or above `start`, if any.
    pub fn discover(start: &Path) -> Result<Option<Self>, ManifestError> {
        find_manifest_upwards(start, MANIFEST_FILE)
            .map(|path| Self::from_path(&path))
            .transpose()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn parse(contents: &str, root: Option<PathBuf>) -> Result<Self, ManifestError> {
        let mut manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        manifest.root = root;
        Ok(Self {
            manifest: Arc::new(manifest),
        })
    }
}

/// Walk from `start` towards the filesystem root looking for `manifest_name`.
pub fn find_manifest_upwards(start: &Path, manifest_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(manifest_name))
        .find(|candidate| candidate.is_file())
}

fn resolve_root_path(path: &Path, cwd: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => cwd.to_path_buf(),
        Some(parent) if parent.is_relative() => cwd.join(parent),
        Some(parent) => parent.to_path_buf(),
        None => cwd.to_path_buf(),
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct Manifest {
    #[serde(default)]
    #[validate(nested)]
    pub app: ManifestApp,
    #[serde(default)]
    #[validate(nested)]
    pub dev: ManifestDev,
    #[serde(default)]
    #[validate(nested)]
    pub function: ManifestFunction,
    #[serde(default)]
    #[validate(nested)]
    pub logging: ManifestLogging,
    #[serde(skip)]
    root: Option<PathBuf>,
}

impl Manifest {
    /// Directory holding the manifest, when it was loaded from disk.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app.name.as_deref()
    }

    /// Logging settings for `adapter`, matched case-insensitively.
    pub fn logging_or_default(&self, adapter: &str) -> ResolvedLoggingConfig {
        self.logging
            .adapters
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(adapter))
            .map(|(_, cfg)| ResolvedLoggingConfig::from_manifest(cfg))
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ManifestApp {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub entry: Option<String>,
}

/// `[dev]`: where the standalone development server listens.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ManifestDev {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub host: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub port: Option<u16>,
    #[serde(default)]
    pub ctrl_c: Option<bool>,
}

impl ManifestDev {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_DEV_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_DEV_PORT)
    }

    pub fn ctrl_c(&self) -> bool {
        self.ctrl_c.unwrap_or(true)
    }

    /// Resolve `host:port`, accepting names such as `localhost`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ManifestError> {
        let target = format!("{}:{}", self.host(), self.port());
        target
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or(ManifestError::Address(target))
    }
}

/// `[function]`: settings for the platform invocation path.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ManifestFunction {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ManifestLogging {
    #[serde(flatten)]
    #[validate(nested)]
    pub adapters: BTreeMap<String, ManifestLoggingConfig>,
}

#[derive(Debug, Default, Deserialize, Clone, Validate)]
pub struct ManifestLoggingConfig {
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub echo_stdout: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLoggingConfig {
    pub level: LogLevel,
    pub echo_stdout: bool,
}

impl Default for ResolvedLoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            echo_stdout: true,
        }
    }
}

impl ResolvedLoggingConfig {
    fn from_manifest(cfg: &ManifestLoggingConfig) -> Self {
        let defaults = Self::default();
        Self {
            level: cfg.level.unwrap_or(defaults.level),
            echo_stdout: cfg.echo_stdout.unwrap_or(defaults.echo_stdout),
        }
    }

    /// Effective filter; silencing output wins over the configured level.
    pub fn level_filter(&self) -> LevelFilter {
        if self.echo_stdout {
            self.level.into()
        } else {
            LevelFilter::Off
        }
    }

    /// Install the process-wide logger at [`Self::level_filter`]. Returns `false` when a
    /// logger was already installed, in which case the existing one is kept.
    pub fn init_logger(&self) -> bool {
        SimpleLogger::new()
            .with_level(self.level_filter())
            .init()
            .is_ok()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" => Ok(Self::Off),
            other => Err(serde::de::Error::custom(format!(
                "logging level must be trace, debug, info, warn, error, or off (got `{}`)",
                other
            ))),
        }
    }
}
