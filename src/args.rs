use clap::Parser;
use std::path::PathBuf;

/// Command-line flags. Anything left unset falls back to the config file, then to the defaults
/// in [`crate::config`].
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML file supplying defaults for every other flag
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    /// 0 lets the OS pick a free port
    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(short, long)]
    pub root: Option<PathBuf>,

    #[arg(short, long)]
    pub index_page: Option<String>,

    /// Cache lifetime in seconds
    #[arg(short, long)]
    pub max_age: Option<u64>,

    /// Regex matched against a file's extension (".html") to allow compression
    #[arg(short, long)]
    pub zip_match: Option<String>,

    /// Regex matched against the request target; matches are forwarded upstream
    #[arg(long)]
    pub proxy_match: Option<String>,

    #[arg(long)]
    pub proxy_target: Option<String>,

    #[arg(short, long)]
    pub open_browser: bool,

    #[arg(short, long)]
    pub gzip_level: Option<u32>,
}
