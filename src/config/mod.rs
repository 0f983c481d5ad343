mod file_config;

pub use file_config::FileConfig;

use std::path::PathBuf;

/// Default service the client talks to.
pub const DEFAULT_BASE_URL: &str = "https://api.storynest.dev";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SEC: u64 = 30;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub base_url: String,
    pub timeout_sec: u64,
    pub session_file: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            session_file: None,
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_sec: u64,
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Self {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let base_url = file.base_url.unwrap_or_else(|| cli.base_url.clone());
        let timeout_sec = file.timeout_sec.unwrap_or(cli.timeout_sec);
        let session_file = file
            .session_file
            .map(PathBuf::from)
            .or_else(|| cli.session_file.clone())
            .unwrap_or_else(default_session_file);

        Self {
            base_url,
            timeout_sec,
            session_file,
        }
    }
}

/// Default location of the persisted session file.
///
/// `$HOME/.storynest/session.json` when a home directory is available,
/// otherwise a dotfile in the working directory.
pub fn default_session_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => {
            PathBuf::from(home).join(".storynest").join("session.json")
        }
        _ => PathBuf::from(".storynest-session.json"),
    }
}
