//! Server configuration: config file loading and merging with the command line.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::args::Args;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_INDEX_PAGE: &str = "index.html";
pub const DEFAULT_MAX_AGE: u64 = 3600;
pub const DEFAULT_ZIP_MATCH: &str = r"^\.(html|htm|js|mjs|css|json|txt|md|svg|xml)$";
pub const DEFAULT_PROXY_TARGET: &str = "http://127.0.0.1";
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("invalid proxy target: {0}")]
    Target(#[from] url::ParseError),
    #[error("unsupported proxy target scheme '{0}' (only http is supported)")]
    Scheme(String),
    #[error("root {0} is not a directory")]
    Root(PathBuf),
    #[error("gzip level {0} is out of range (0-9)")]
    GzipLevel(u32),
}

/// Contents of the optional TOML config file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub index_page: Option<String>,
    pub max_age: Option<u64>,
    pub zip_match: Option<String>,
    pub proxy_match: Option<String>,
    pub proxy_target: Option<String>,
    pub open_browser: Option<bool>,
    pub gzip_level: Option<u32>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Immutable settings shared by every connection handler.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub root: PathBuf,
    pub index_page: String,
    pub max_age: u64,
    pub zip_match: Regex,
    pub proxy_match: Option<Regex>,
    pub proxy_target: Url,
    pub open_browser: bool,
    pub gzip_level: u32,
}

impl ServerConfig {
    /// Defaults for serving `root`. Nothing is proxied until `proxy_match` is set.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
            root: root.into(),
            index_page: DEFAULT_INDEX_PAGE.to_string(),
            max_age: DEFAULT_MAX_AGE,
            zip_match: compile("zip_match", DEFAULT_ZIP_MATCH)?,
            proxy_match: None,
            proxy_target: parse_target(DEFAULT_PROXY_TARGET)?,
            open_browser: false,
            gzip_level: DEFAULT_GZIP_LEVEL,
        })
    }

    /// Merges command-line flags over the config file (when given) over the defaults, then
    /// validates the result.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => {
                log::debug!("Loading config file {}", path.display());
                FileConfig::from_path(path)?
            }
            None => FileConfig::default(),
        };

        let root = args
            .root
            .clone()
            .or(file.root)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::new(root)?;

        if let Some(host) = args.host.clone().or(file.host) {
            config.host = host;
        }
        if let Some(port) = args.port.or(file.port) {
            config.port = port;
        }
        if let Some(index_page) = args.index_page.clone().or(file.index_page) {
            config.index_page = index_page;
        }
        if let Some(max_age) = args.max_age.or(file.max_age) {
            config.max_age = max_age;
        }
        if let Some(pattern) = args.zip_match.as_deref().or(file.zip_match.as_deref()) {
            config.zip_match = compile("zip_match", pattern)?;
        }
        if let Some(pattern) = args.proxy_match.as_deref().or(file.proxy_match.as_deref()) {
            config.proxy_match = Some(compile("proxy_match", pattern)?);
        }
        if let Some(target) = args
            .proxy_target
            .as_deref()
            .or(file.proxy_target.as_deref())
        {
            config.proxy_target = parse_target(target)?;
        }
        config.open_browser = args.open_browser || file.open_browser.unwrap_or(false);
        if let Some(level) = args.gzip_level.or(file.gzip_level) {
            if level > 9 {
                return Err(ConfigError::GzipLevel(level));
            }
            config.gzip_level = level;
        }

        if !config.root.is_dir() {
            return Err(ConfigError::Root(config.root));
        }

        Ok(config)
    }

    pub fn with_proxy(mut self, pattern: &str, target: &str) -> Result<Self, ConfigError> {
        self.proxy_match = Some(compile("proxy_match", pattern)?);
        self.proxy_target = parse_target(target)?;
        Ok(self)
    }

    pub fn with_zip_match(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.zip_match = compile("zip_match", pattern)?;
        Ok(self)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether `path`'s extension (with its leading dot) matches `zip_match`.
    pub fn is_compressible(&self, path: &Path) -> bool {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        self.zip_match.is_match(&extension)
    }

    /// Whether the raw request target is forwarded upstream.
    pub fn is_proxied(&self, target: &str) -> bool {
        self.proxy_match
            .as_ref()
            .map(|pattern| pattern.is_match(target))
            .unwrap_or(false)
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern { name, source })
}

fn parse_target(target: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(target)?;
    if url.scheme() != "http" {
        return Err(ConfigError::Scheme(url.scheme().to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn compressible_extension_includes_dot() {
        let config = ServerConfig::new(".").unwrap();
        assert!(config.is_compressible(Path::new("a/b/index.html")));
        assert!(config.is_compressible(Path::new("app.js")));
        assert!(!config.is_compressible(Path::new("photo.png")));
        assert!(!config.is_compressible(Path::new("Makefile")));
    }

    #[test]
    fn nothing_is_proxied_by_default() {
        let config = ServerConfig::new(".").unwrap();
        assert!(!config.is_proxied("/api/users"));

        let config = config.with_proxy("^/api/", "http://127.0.0.1:9000").unwrap();
        assert!(config.is_proxied("/api/users"));
        assert!(!config.is_proxied("/static/api/users"));
    }

    #[test]
    fn rejects_https_target() {
        let err = ServerConfig::new(".")
            .unwrap()
            .with_proxy("^/api", "https://example.com")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Scheme(ref s) if s == "https"));
    }

    #[test]
    fn command_line_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "port = 8080\nmax_age = 10\nindex_page = \"home.html\"\nroot = {:?}",
            dir.path()
        )
        .unwrap();

        let args = Args {
            config: Some(path),
            port: Some(9090),
            ..Args::default()
        };
        let config = ServerConfig::load(&args).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.max_age, 10);
        assert_eq!(config.index_page, "home.html");
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn missing_root_is_an_error() {
        let args = Args {
            root: Some(PathBuf::from("/definitely/not/here")),
            ..Args::default()
        };
        assert!(matches!(
            ServerConfig::load(&args),
            Err(ConfigError::Root(_))
        ));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            root: Some(dir.path().to_path_buf()),
            zip_match: Some("(".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            ServerConfig::load(&args),
            Err(ConfigError::Pattern { name: "zip_match", .. })
        ));
    }
}
