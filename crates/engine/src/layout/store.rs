use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::defaults::default_layout;
use super::types::{LayoutValidationError, OfficeLayout};

pub const DEFAULT_LAYOUT_RELATIVE_PATH: &str = "assets/default-layout.json";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LayoutLoadError {
    #[error("failed to read layout file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("layout request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("layout request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{}", describe_parse_error(.source_name, .path, .message))]
    Parse {
        source_name: String,
        path: String,
        message: String,
    },
    #[error("layout from {source_name} is invalid: {error}")]
    Invalid {
        source_name: String,
        #[source]
        error: LayoutValidationError,
    },
}

fn describe_parse_error(source_name: &str, path: &str, message: &str) -> String {
    if path.is_empty() || path == "." {
        format!("failed to parse layout json from {source_name}: {message}")
    } else {
        format!("failed to parse layout json from {source_name} at {path}: {message}")
    }
}

/// Where the raw layout document comes from. One attempt per call, no retries.
pub trait LayoutSource {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<String, LayoutLoadError>;
}

#[derive(Debug, Clone)]
pub struct FileLayoutSource {
    path: PathBuf,
}

impl FileLayoutSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LayoutSource for FileLayoutSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String, LayoutLoadError> {
        fs::read_to_string(&self.path).map_err(|source| LayoutLoadError::ReadFile {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpLayoutSource {
    url: String,
    timeout: Duration,
}

impl HttpLayoutSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl LayoutSource for HttpLayoutSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<String, LayoutLoadError> {
        let request_error = |source| LayoutLoadError::Request {
            url: self.url.clone(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(request_error)?;
        let response = client.get(&self.url).send().map_err(request_error)?;
        let status = response.status();
        debug!(url = %self.url, status = status.as_u16(), "layout_http_response");
        if !status.is_success() {
            return Err(LayoutLoadError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(request_error)
    }
}

impl<F> LayoutSource for F
where
    F: Fn() -> Result<String, LayoutLoadError>,
{
    fn describe(&self) -> String {
        "inline".to_string()
    }

    fn fetch(&self) -> Result<String, LayoutLoadError> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOrigin {
    Resource,
    Fallback,
}

impl fmt::Display for LayoutOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource => f.write_str("resource"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

pub struct LayoutStore {
    source: Box<dyn LayoutSource>,
}

impl LayoutStore {
    pub fn new(source: impl LayoutSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub fn load_layout(&self) -> Result<OfficeLayout, LayoutLoadError> {
        let raw = self.source.fetch()?;
        let layout = parse_layout(&self.source.describe(), &raw)?;
        info!(
            source = %self.source.describe(),
            cols = layout.cols,
            rows = layout.rows,
            furniture_count = layout.furniture.len(),
            "layout_loaded"
        );
        Ok(layout)
    }

    pub fn load_or_default(&self) -> (OfficeLayout, LayoutOrigin) {
        match self.load_layout() {
            Ok(layout) => (layout, LayoutOrigin::Resource),
            Err(error) => {
                warn!(
                    source = %self.source.describe(),
                    error = %error,
                    "layout_load_failed_using_default"
                );
                (default_layout(), LayoutOrigin::Fallback)
            }
        }
    }
}

impl fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutStore")
            .field("source", &self.source.describe())
            .finish()
    }
}

pub fn parse_layout(source_name: &str, raw: &str) -> Result<OfficeLayout, LayoutLoadError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let mut layout = serde_path_to_error::deserialize::<_, OfficeLayout>(&mut deserializer)
        .map_err(|error| {
            let path = error.path().to_string();
            LayoutLoadError::Parse {
                source_name: source_name.to_string(),
                path,
                message: error.into_inner().to_string(),
            }
        })?;
    let invalid = |error| LayoutLoadError::Invalid {
        source_name: source_name.to_string(),
        error,
    };
    layout.fill_missing_tiles().map_err(invalid)?;
    layout.validate().map_err(invalid)?;
    Ok(layout)
}
