//! CLI error type and construction of the API handle.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use gtaskqueue_api::{
    ApiEndpoint, ApiError, DeveloperKeyLayer, DumpRequestLayer, RestTasksApi,
    ServiceAccountTokenSource, StaticTokenSource, TokenSource,
};
use reqwest::Client;
use url::Url;

/// CLI-level error type to distinguish usage from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::failure(err)
    }
}

/// Everything needed to talk to the service, resolved once from flags.
#[derive(Debug, Clone)]
pub(crate) struct ClientSettings {
    pub(crate) api_host: Url,
    pub(crate) service_version: String,
    pub(crate) service_account_file: PathBuf,
    pub(crate) access_token: Option<String>,
    pub(crate) use_developer_key: bool,
    pub(crate) developer_key_file: PathBuf,
    pub(crate) dump_request: bool,
    pub(crate) timeout: Duration,
}

impl ClientSettings {
    /// Build the REST handle: HTTP client, token source, then request layers.
    pub(crate) fn build_api(&self) -> CliResult<RestTasksApi> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        let tokens: Arc<dyn TokenSource> = match &self.access_token {
            Some(token) => Arc::new(StaticTokenSource::new(token.trim())),
            None => {
                let source =
                    ServiceAccountTokenSource::from_file(&self.service_account_file, client.clone())?;
                tracing::debug!(client_email = source.client_email(), "using service account");
                Arc::new(source)
            }
        };

        let endpoint = ApiEndpoint::new(self.api_host.clone(), self.service_version.clone());
        let mut api = RestTasksApi::new(client, endpoint, tokens);
        if self.use_developer_key {
            api = api.with_layer(DeveloperKeyLayer::from_file(&self.developer_key_file)?);
        }
        if self.dump_request {
            api = api.with_layer(DumpRequestLayer::stderr());
        }
        Ok(api)
    }
}

/// Parse the API host provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
