//! HTTP client for the admin API.
//!
//! Used by the dashboard (and through it, the CLI) to manage the menu on a
//! running admin server.
//!
//! # API Reference
//!
//! - Base URL: `ADMIN_API_URL` (default `http://localhost:3001`)
//! - Authentication: `Authorization: Bearer <ADMIN_API_TOKEN>`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use after10_core::{Item, ItemId, ItemInput, ItemPatch, Section, SectionId};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::db::SectionDeletion;
use crate::models::{
    DeleteEnvelope, ItemDeleted, ItemEnvelope, ItemsDeleted, ItemsEnvelope, SectionEnvelope,
    SectionInput, SectionsEnvelope, UploadResponse,
};

/// Default admin API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Wall-clock budget for deleting all of a section's items.
pub const BULK_DELETE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the admin API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The request did not finish within its time budget.
    #[error("Request timed out")]
    TimedOut,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Reading a local file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Client configuration was invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether the server answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

/// Menu operations the dashboard needs from the admin API.
pub trait MenuApi: Send + Sync {
    fn list_sections(&self) -> impl Future<Output = Result<Vec<Section>, ApiError>> + Send;

    fn list_items(&self) -> impl Future<Output = Result<Vec<Item>, ApiError>> + Send;

    fn create_section(&self, name: &str)
    -> impl Future<Output = Result<Section, ApiError>> + Send;

    fn rename_section(
        &self,
        id: SectionId,
        name: &str,
    ) -> impl Future<Output = Result<Section, ApiError>> + Send;

    fn delete_section(
        &self,
        id: SectionId,
    ) -> impl Future<Output = Result<SectionDeletion, ApiError>> + Send;

    fn create_item(&self, input: &ItemInput)
    -> impl Future<Output = Result<Item, ApiError>> + Send;

    fn replace_item(
        &self,
        id: ItemId,
        input: &ItemInput,
    ) -> impl Future<Output = Result<Item, ApiError>> + Send;

    fn patch_item(
        &self,
        id: ItemId,
        patch: &ItemPatch,
    ) -> impl Future<Output = Result<Item, ApiError>> + Send;

    fn delete_item(&self, id: ItemId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete every item in a section. Must give up with
    /// [`ApiError::TimedOut`] after [`BULK_DELETE_TIMEOUT`].
    fn delete_section_items(
        &self,
        id: SectionId,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send;

    /// Upload an image file and return its public URL.
    fn upload_image(&self, path: &Path) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// Admin API client.
#[derive(Clone)]
pub struct AdminApi {
    inner: Arc<AdminApiInner>,
}

struct AdminApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl AdminApi {
    /// Create a new admin API client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: &str, token: &SecretString) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ApiError::Config(format!("Invalid API token format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminApiInner { client, base_url }),
        })
    }

    /// The server this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Config(format!("invalid path '{path}': {e}")))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)?).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn put<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .put(self.url(path)?)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn patch<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .patch(self.url(path)?)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn delete<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.client.delete(self.url(path)?);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::TimedOut
            } else {
                ApiError::Http(e)
            }
        })?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Error bodies carry `message` (and `error`); fall back to the raw text.
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| {
                body.get("message")
                    .or_else(|| body.get("error"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(text);

        ApiError::Api { status, message }
    }
}

impl MenuApi for AdminApi {
    #[instrument(skip(self))]
    async fn list_sections(&self) -> Result<Vec<Section>, ApiError> {
        let envelope: SectionsEnvelope = self.get("/api/sections").await?;
        Ok(envelope.sections)
    }

    #[instrument(skip(self))]
    async fn list_items(&self) -> Result<Vec<Item>, ApiError> {
        let envelope: ItemsEnvelope = self.get("/api/items").await?;
        Ok(envelope.items)
    }

    #[instrument(skip(self))]
    async fn create_section(&self, name: &str) -> Result<Section, ApiError> {
        let body = SectionInput {
            name: name.to_string(),
        };
        let envelope: SectionEnvelope = self.post("/api/sections", &body).await?;
        Ok(envelope.section)
    }

    #[instrument(skip(self))]
    async fn rename_section(&self, id: SectionId, name: &str) -> Result<Section, ApiError> {
        let body = SectionInput {
            name: name.to_string(),
        };
        let envelope: SectionEnvelope = self.put(&format!("/api/sections/{id}"), &body).await?;
        Ok(envelope.section)
    }

    #[instrument(skip(self))]
    async fn delete_section(&self, id: SectionId) -> Result<SectionDeletion, ApiError> {
        let envelope: DeleteEnvelope<SectionDeletion> =
            self.delete(&format!("/api/sections/{id}"), None).await?;
        Ok(envelope.data)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_item(&self, input: &ItemInput) -> Result<Item, ApiError> {
        let envelope: ItemEnvelope = self.post("/api/items", input).await?;
        Ok(envelope.item)
    }

    #[instrument(skip(self, input))]
    async fn replace_item(&self, id: ItemId, input: &ItemInput) -> Result<Item, ApiError> {
        let envelope: ItemEnvelope = self.put(&format!("/api/items/{id}"), input).await?;
        Ok(envelope.item)
    }

    #[instrument(skip(self, patch))]
    async fn patch_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, ApiError> {
        let envelope: ItemEnvelope = self.patch(&format!("/api/items/{id}"), patch).await?;
        Ok(envelope.item)
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, id: ItemId) -> Result<(), ApiError> {
        let _: DeleteEnvelope<ItemDeleted> =
            self.delete(&format!("/api/items/{id}"), None).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_section_items(&self, id: SectionId) -> Result<u64, ApiError> {
        let envelope: DeleteEnvelope<ItemsDeleted> = self
            .delete(
                &format!("/api/items/section/{id}"),
                Some(BULK_DELETE_TIMEOUT),
            )
            .await?;
        Ok(envelope.data.deleted_count)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn upload_image(&self, path: &Path) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .inner
            .client
            .post(self.url("/api/upload")?)
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = Self::handle_response(response).await?;
        Ok(upload.url)
    }
}

impl std::fmt::Debug for AdminApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
