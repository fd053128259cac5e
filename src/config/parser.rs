//! Resource loader for API definitions.
//!
//! A resource is a file path, an `http(s)://` URL, or `-` for stdin. The
//! content may be JSON or YAML; it is parsed with the YAML parser (a JSON
//! superset) and converted to a JSON value.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, ImportError, Result};

/// Resource name designating standard input.
pub const STDIN_RESOURCE: &str = "-";

/// Timeout applied when fetching a definition over HTTP.
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Loads API definitions from files, URLs or stdin.
#[derive(Debug, Default)]
pub struct SpecLoader {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl SpecLoader {
    /// Creates a new loader.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads and parses a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be read, does not parse, or is
    /// not a JSON/YAML mapping.
    pub async fn load(&self, resource: &str) -> Result<Value> {
        if resource == STDIN_RESOURCE {
            info!("Reading API definition from stdin");
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            return Self::parse(&content, None);
        }

        if let Ok(url) = Url::parse(resource)
            && matches!(url.scheme(), "http" | "https")
        {
            return Self::load_url(url).await;
        }

        self.load_file(resource)
    }

    /// Loads a definition from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = self.resolve(path.as_ref());
        info!("Loading API definition from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound { path }.into());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })?;

        Self::parse(&content, Some(&path.display().to_string()))
    }

    async fn load_url(url: Url) -> Result<Value> {
        info!("Fetching API definition from: {url}");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| ImportError::internal(format!("Failed to create HTTP client: {e}")))?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ConfigError::ParseError {
                message: format!("Failed to fetch resource: {e}"),
                location: Some(url.to_string()),
            })?;

        let content = response.text().await.map_err(|e| ConfigError::ParseError {
            message: format!("Failed to read response body: {e}"),
            location: Some(url.to_string()),
        })?;

        Self::parse(&content, Some(url.as_str()))
    }

    /// Parses JSON or YAML content into a mapping.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed content and an unsupported-format
    /// error when the top level is not a mapping.
    pub fn parse(content: &str, source: Option<&str>) -> Result<Value> {
        debug!("Parsing API definition ({} bytes)", content.len());

        let document: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
            location: source.map(String::from),
        })?;

        if !document.is_object() {
            return Err(ConfigError::UnsupportedFormat.into());
        }

        Ok(document)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.resolve(Path::new(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
