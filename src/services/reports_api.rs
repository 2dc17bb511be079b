//! HTTP client for the bulk report endpoints

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::models::wire::{BulkConfigureRequest, ErrorBody, RawBatchStatus};
use crate::services::credentials::CredentialProvider;

/// Backend operations the tracker depends on
#[async_trait]
pub trait ReportsApi: Send + Sync {
    /// `POST /reports/bulk_configure/`
    async fn configure_bulk(&self, request: &BulkConfigureRequest) -> Result<RawBatchStatus, ApiError>;

    /// `GET /reports/bulk/{batch_id}/progress/`
    async fn bulk_progress(&self, batch_id: &str) -> Result<RawBatchStatus, ApiError>;
}

#[async_trait]
impl<T: ReportsApi + ?Sized> ReportsApi for Arc<T> {
    async fn configure_bulk(&self, request: &BulkConfigureRequest) -> Result<RawBatchStatus, ApiError> {
        (**self).configure_bulk(request).await
    }

    async fn bulk_progress(&self, batch_id: &str) -> Result<RawBatchStatus, ApiError> {
        (**self).bulk_progress(batch_id).await
    }
}

pub struct ReportsClient {
    base_url: Url,
    http: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl ReportsClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http, credentials)
    }

    pub fn with_client(
        base_url: &str,
        http: Client,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments (percent-encoded) and a trailing slash
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<RawBatchStatus, ApiError> {
        let response = self.authorize(request).header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: ErrorBody::detail_from(&body),
            });
        }

        Ok(RawBatchStatus::from_json(&body)?)
    }
}

#[async_trait]
impl ReportsApi for ReportsClient {
    async fn configure_bulk(&self, request: &BulkConfigureRequest) -> Result<RawBatchStatus, ApiError> {
        let url = self.endpoint(&["reports", "bulk_configure"])?;
        debug!(url = %url, symbols = request.stock_symbols.len(), "Submitting bulk report request");
        self.execute(self.http.post(url).json(request)).await
    }

    async fn bulk_progress(&self, batch_id: &str) -> Result<RawBatchStatus, ApiError> {
        let url = self.endpoint(&["reports", "bulk", batch_id, "progress"])?;
        debug!(url = %url, batch_id = %batch_id, "Fetching bulk report progress");
        self.execute(self.http.get(url)).await
    }
}
