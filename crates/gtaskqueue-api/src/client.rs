//! The [`TasksApi`] seam and its REST implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::TokenSource;
use crate::error::{ApiError, ApiResult};
use crate::layers::RequestLayer;
use crate::models::{
    ErrorEnvelope, LeaseTasksRequest, LeaseTasksResponse, ListOptions, ListTasksResponse,
    ResponseView, Task,
};

/// Default API host.
pub const DEFAULT_API_HOST: &str = "https://cloudtasks.googleapis.com/";
/// Default API version segment.
pub const DEFAULT_SERVICE_VERSION: &str = "v2beta2";

/// Task operations scoped to queue and task resource names.
#[async_trait]
pub trait TasksApi: Send + Sync {
    /// Fetch a single task by resource name.
    async fn get(&self, name: &str) -> ApiResult<Task>;

    /// List tasks in the queue named `parent`.
    async fn list(&self, parent: &str, options: &ListOptions) -> ApiResult<ListTasksResponse>;

    /// Lease tasks from the queue named `parent`.
    async fn lease(
        &self,
        parent: &str,
        request: &LeaseTasksRequest,
    ) -> ApiResult<LeaseTasksResponse>;

    /// Delete a task by resource name.
    async fn delete(&self, name: &str) -> ApiResult<()>;
}

/// Host and version the REST calls are issued against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    host: Url,
    version: String,
}

impl ApiEndpoint {
    /// Pair a host URL with a version segment (e.g. `v2beta2`).
    #[must_use]
    pub fn new(host: Url, version: impl Into<String>) -> Self {
        Self {
            host,
            version: version.into(),
        }
    }

    /// `{host}{version}/`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when the host cannot carry a path.
    pub fn base_url(&self) -> ApiResult<Url> {
        let mut host = self.host.clone();
        if !host.path().ends_with('/') {
            let path = format!("{}/", host.path());
            host.set_path(&path);
        }
        host.join(&format!("{}/", self.version.trim_matches('/')))
            .map_err(|err| ApiError::InvalidUrl {
                reason: format!("cannot combine {} with {}: {err}", self.host, self.version),
            })
    }

    /// URL of a resource name, one path segment per name component.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when the host cannot carry a path.
    pub fn resource_url(&self, resource: &str) -> ApiResult<Url> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                reason: format!("{} cannot be a base URL", self.host),
            })?
            .pop_if_empty()
            .extend(resource.split('/'));
        Ok(url)
    }
}

/// [`TasksApi`] over HTTPS with bearer authentication and request layers.
pub struct RestTasksApi {
    client: Client,
    endpoint: ApiEndpoint,
    tokens: Arc<dyn TokenSource>,
    layers: Vec<Arc<dyn RequestLayer>>,
}

impl RestTasksApi {
    /// Construct a client without any request layers.
    #[must_use]
    pub fn new(client: Client, endpoint: ApiEndpoint, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client,
            endpoint,
            tokens,
            layers: Vec::new(),
        }
    }

    /// Append a request layer; layers run in the order they are added.
    #[must_use]
    pub fn with_layer(mut self, layer: impl RequestLayer + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    async fn execute(&self, builder: RequestBuilder, path: &str) -> ApiResult<Response> {
        let token = self.tokens.access_token().await?;
        let mut request =
            builder
                .bearer_auth(token)
                .build()
                .map_err(|source| ApiError::Transport {
                    path: path.to_string(),
                    source,
                })?;
        for layer in &self.layers {
            tracing::trace!(layer = layer.name(), "applying request layer");
            request = layer.apply(request)?;
        }

        tracing::debug!(method = %request.method(), path, "sending request");
        let response =
            self.client
                .execute(request)
                .await
                .map_err(|source| ApiError::Transport {
                    path: path.to_string(),
                    source,
                })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_error(response).await)
        }
    }
}

#[async_trait]
impl TasksApi for RestTasksApi {
    async fn get(&self, name: &str) -> ApiResult<Task> {
        let mut url = self.endpoint.resource_url(name)?;
        url.query_pairs_mut()
            .append_pair("responseView", ResponseView::Full.as_str());
        let response = self.execute(self.client.get(url), name).await?;
        decode(response, name).await
    }

    async fn list(&self, parent: &str, options: &ListOptions) -> ApiResult<ListTasksResponse> {
        let path = format!("{parent}/tasks");
        let mut url = self.endpoint.resource_url(&path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in options.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        let response = self.execute(self.client.get(url), &path).await?;
        decode(response, &path).await
    }

    async fn lease(
        &self,
        parent: &str,
        request: &LeaseTasksRequest,
    ) -> ApiResult<LeaseTasksResponse> {
        let path = format!("{parent}/tasks:lease");
        let url = self.endpoint.resource_url(&path)?;
        let response = self
            .execute(self.client.post(url).json(request), &path)
            .await?;
        decode(response, &path).await
    }

    async fn delete(&self, name: &str) -> ApiResult<()> {
        let url = self.endpoint.resource_url(name)?;
        self.execute(self.client.delete(url), name).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> ApiResult<T> {
    let bytes = response.bytes().await.map_err(|err| ApiError::Decode {
        path: path.to_string(),
        reason: err.to_string(),
    })?;
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &bytes
    };
    serde_json::from_slice(body).map_err(|err| ApiError::Decode {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Turn a non-success response into [`ApiError::Status`].
async fn classify_error(response: Response) -> ApiError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&bytes).trim().to_string();

    let message = match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
        Ok(envelope) => match (envelope.error.status, envelope.error.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => format!("request failed with status {status}"),
        },
        Err(_) if !body_text.is_empty() => body_text,
        Err(_) => format!("request failed with status {status}"),
    };

    ApiError::Status { status, message }
}
