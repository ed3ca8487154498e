use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "rapport-extract";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the upload interface.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

/// Default timeout for the document-read step. Malformed PDFs can make
/// the parser spin, so reading is always bounded.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Default upload size limit (50 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,rapport_extract=info,tower_http=warn"
}

/// Get the application data directory.
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (trained taggers live in sub-directories).
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the staging directory for uploaded documents.
pub fn staging_dir() -> PathBuf {
    app_data_dir().join("staging")
}

/// Runtime settings shared by the CLI and the upload server.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub models_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Explicit model choice; `None` applies the registry selection policy.
    pub preferred_model: Option<String>,
    pub read_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models_dir: models_dir(),
            staging_dir: staging_dir(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            preferred_model: None,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_dir_under_app_data() {
        let models = models_dir();
        assert!(models.starts_with(app_data_dir()));
        assert!(models.ends_with("models"));
    }

    #[test]
    fn staging_dir_under_app_data() {
        let staging = staging_dir();
        assert!(staging.starts_with(app_data_dir()));
        assert!(staging.ends_with("staging"));
    }

    #[test]
    fn default_bind_addr_parses() {
        let parsed: SocketAddr = DEFAULT_BIND_ADDR.parse().unwrap();
        assert_eq!(parsed, AppConfig::default().bind_addr);
    }

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config.preferred_model.is_none());
    }

    #[test]
    fn app_name_is_stable() {
        assert_eq!(APP_NAME, "rapport-extract");
    }
}
