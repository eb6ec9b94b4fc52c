//! Request middleware composed around the transport call.
//!
//! Each layer receives the fully built request (bearer token already set) and
//! returns the request to send. Layers run in registration order.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Request;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::json::to_sorted_pretty;

/// Transformation applied to every outgoing request.
pub trait RequestLayer: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Transform (or observe) the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns an error to abort the call.
    fn apply(&self, request: Request) -> ApiResult<Request>;
}

/// Appends the `key` query parameter to every request.
#[derive(Clone)]
pub struct DeveloperKeyLayer {
    key: String,
}

impl DeveloperKeyLayer {
    /// Use `key` as the developer key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Read the developer key from `path`, expanding a leading `~`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::DeveloperKeyMissing`] when the file does not exist
    /// and [`ApiError::DeveloperKeyRead`] when it cannot be read.
    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let resolved = expand_home(path);
        match std::fs::read_to_string(&resolved) {
            Ok(contents) => Ok(Self::new(contents.trim())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ApiError::DeveloperKeyMissing { path: resolved })
            }
            Err(source) => Err(ApiError::DeveloperKeyRead {
                path: resolved,
                source,
            }),
        }
    }
}

impl RequestLayer for DeveloperKeyLayer {
    fn name(&self) -> &'static str {
        "developer_key"
    }

    fn apply(&self, mut request: Request) -> ApiResult<Request> {
        request.url_mut().query_pairs_mut().append_pair("key", &self.key);
        Ok(request)
    }
}

type DumpSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Writes a human-readable copy of every request to a sink.
#[derive(Clone)]
pub struct DumpRequestLayer {
    sink: DumpSink,
}

impl DumpRequestLayer {
    /// Dump requests to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_sink(|dump| eprint!("{dump}"))
    }

    /// Dump requests to a custom sink.
    #[must_use]
    pub fn with_sink(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }
}

impl RequestLayer for DumpRequestLayer {
    fn name(&self) -> &'static str {
        "dump_request"
    }

    fn apply(&self, request: Request) -> ApiResult<Request> {
        (self.sink)(&format_request_dump(&request));
        Ok(request)
    }
}

/// Render a request as method, URL, headers and body.
///
/// The bearer credential is masked; JSON bodies are printed with sorted keys.
#[must_use]
pub fn format_request_dump(request: &Request) -> String {
    let mut out = String::from("--request-start--\n");
    let _ = writeln!(out, "{} {}", request.method(), request.url());
    for (name, value) in request.headers() {
        if *name == AUTHORIZATION {
            let _ = writeln!(out, "{name}: Bearer <redacted>");
        } else {
            let _ = writeln!(out, "{name}: {}", value.to_str().unwrap_or("<binary>"));
        }
    }
    out.push('\n');
    if let Some(bytes) = request.body().and_then(reqwest::Body::as_bytes) {
        let rendered = serde_json::from_slice::<Value>(bytes)
            .ok()
            .and_then(|value| to_sorted_pretty(value).ok())
            .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned());
        out.push_str(&rendered);
        out.push('\n');
    }
    out.push_str("--request-end--\n");
    out
}

/// Replace a leading `~` with the current user's home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
