use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Result, Step, UploadError};
use crate::ranged_body::RangedBody;
use crate::rest_types::{
    ChunkId, CommitReleaseUploadRequest, CommitSymbolUploadRequest, DistributionRequest,
    PrepareSymbolUploadRequest, PreparedReleaseUpload, SymbolUploadSession, UploadMetadata,
    UploadStatus,
};

pub const DEFAULT_APPCENTER_BASE_URL: &str = "https://api.appcenter.ms/v0.1/";

const API_TOKEN_HEADER: &str = "X-API-Token";
const JSON_CONTENT_TYPE: &str = "application/json";
const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
const BLOCK_BLOB: &str = "BlockBlob";

const UPLOAD_ROUTE: &str = "upload";

/// Appends path segments to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UploadError::InvalidUrl {
            url: base.to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends a request and keeps the response only if it is a 2xx.
async fn send(step: Step, request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|source| transport(step, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UploadError::RemoteCall {
            step,
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    tracing::debug!(%step, status = status.as_u16(), "Remote call succeeded");
    Ok(response)
}

async fn send_json<T: DeserializeOwned>(step: Step, request: RequestBuilder) -> Result<T> {
    send(step, request)
        .await?
        .json()
        .await
        .map_err(|source| transport(step, source))
}

/// Upload domain URLs carry the upload token in their query string.
fn transport(step: Step, source: reqwest::Error) -> UploadError {
    UploadError::Transport {
        step,
        source: source.without_url(),
    }
}

/// Builds the clients for one App Center account.
///
/// The upload domain client can only be built once a release upload has been
/// prepared, so it comes out of [`ApiFactory::upload_api`] instead of being
/// created up front.
#[derive(Debug, Clone)]
pub struct ApiFactory {
    client: Client,
    base_url: Url,
    api_token: String,
}

impl ApiFactory {
    pub fn new(base_url: Url, api_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_token,
        }
    }

    pub fn app_center(&self) -> AppCenterApi {
        AppCenterApi {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone(),
        }
    }

    pub fn upload_api(&self, upload_domain: &str) -> Result<UploadApi> {
        let domain = Url::parse(upload_domain).map_err(|_| UploadError::InvalidUrl {
            url: upload_domain.to_string(),
        })?;
        if domain.cannot_be_a_base() {
            return Err(UploadError::InvalidUrl {
                url: upload_domain.to_string(),
            });
        }

        Ok(UploadApi {
            client: self.client.clone(),
            domain,
            api_token: self.api_token.clone(),
        })
    }

    pub fn blob_storage(&self) -> BlobStorage {
        BlobStorage {
            client: self.client.clone(),
        }
    }
}

fn api_request(
    client: &Client,
    api_token: &str,
    method: Method,
    url: Url,
    content_type: &str,
) -> RequestBuilder {
    tracing::debug!(%method, %url, "Sending request");
    client
        .request(method, url)
        .header(API_TOKEN_HEADER, api_token)
        .header(CONTENT_TYPE, content_type)
        .header(ACCEPT, JSON_CONTENT_TYPE)
}

/// Owner/app scoped endpoints of the App Center API.
#[derive(Debug, Clone)]
pub struct AppCenterApi {
    client: Client,
    base_url: Url,
    api_token: String,
}

impl AppCenterApi {
    fn app_endpoint(&self, owner: &str, app: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["apps", owner, app];
        segments.extend_from_slice(rest);
        endpoint(&self.base_url, &segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        api_request(&self.client, &self.api_token, method, url, JSON_CONTENT_TYPE)
    }

    pub async fn prepare_release_upload(
        &self,
        owner: &str,
        app: &str,
    ) -> Result<PreparedReleaseUpload> {
        let url = self.app_endpoint(owner, app, &["uploads", "releases"])?;
        send_json(Step::PrepareReleaseUpload, self.request(Method::POST, url)).await
    }

    pub async fn commit_release_upload(&self, owner: &str, app: &str, upload_id: &str) -> Result<()> {
        let url = self.app_endpoint(owner, app, &["uploads", "releases", upload_id])?;
        let request = CommitReleaseUploadRequest {
            status: crate::rest_types::UPLOAD_FINISHED.to_string(),
        };
        send(
            Step::CommitReleaseUpload,
            self.request(Method::PATCH, url).json(&request),
        )
        .await?;
        Ok(())
    }

    pub async fn get_upload(&self, owner: &str, app: &str, upload_id: &str) -> Result<UploadStatus> {
        let url = self.app_endpoint(owner, app, &["uploads", "releases", upload_id])?;
        send_json(Step::GetUpload, self.request(Method::GET, url)).await
    }

    pub async fn distribute(
        &self,
        owner: &str,
        app: &str,
        release_id: &str,
        request: &DistributionRequest,
    ) -> Result<()> {
        let url = self.app_endpoint(owner, app, &["releases", release_id])?;
        send(Step::Distribute, self.request(Method::PATCH, url).json(request)).await?;
        Ok(())
    }

    pub async fn prepare_symbol_upload(
        &self,
        owner: &str,
        app: &str,
        request: &PrepareSymbolUploadRequest,
    ) -> Result<SymbolUploadSession> {
        let url = self.app_endpoint(owner, app, &["symbol_uploads"])?;
        send_json(
            Step::PrepareSymbolUpload,
            self.request(Method::POST, url).json(request),
        )
        .await
    }

    pub async fn commit_symbol_upload(
        &self,
        owner: &str,
        app: &str,
        symbol_upload_id: &str,
    ) -> Result<()> {
        let url = self.app_endpoint(owner, app, &["symbol_uploads", symbol_upload_id])?;
        let request = CommitSymbolUploadRequest {
            status: crate::rest_types::SYMBOL_COMMITTED.to_string(),
        };
        send(
            Step::CommitSymbolUpload,
            self.request(Method::PATCH, url).json(&request),
        )
        .await?;
        Ok(())
    }
}

/// Endpoints of the upload domain handed out by a prepared release upload.
#[derive(Debug, Clone)]
pub struct UploadApi {
    client: Client,
    domain: Url,
    api_token: String,
}

impl UploadApi {
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        api_request(&self.client, &self.api_token, method, url, JSON_CONTENT_TYPE)
    }

    pub async fn set_metadata(
        &self,
        package_asset_id: &str,
        file_name: &str,
        file_size: u64,
        token: &str,
        content_type: &str,
    ) -> Result<UploadMetadata> {
        let url = endpoint(&self.domain, &[UPLOAD_ROUTE, "set_metadata", package_asset_id])?;
        let file_size = file_size.to_string();
        let request = self.request(Method::POST, url).query(&[
            ("file_name", file_name),
            ("file_size", file_size.as_str()),
            ("token", token),
            ("content_type", content_type),
        ]);
        send_json(Step::SetMetadata, request).await
    }

    pub async fn upload_chunk(
        &self,
        package_asset_id: &str,
        chunk_id: &ChunkId,
        token: &str,
        chunk: RangedBody,
    ) -> Result<()> {
        let url = endpoint(&self.domain, &[UPLOAD_ROUTE, "upload_chunk", package_asset_id])?;
        let block_number = chunk_id.to_string();
        let content_type = chunk.content_type().to_string();
        let content_length = chunk.content_length();
        let body = chunk.into_body().await?;

        let request = api_request(
            &self.client,
            &self.api_token,
            Method::POST,
            url,
            &content_type,
        )
        .query(&[("token", token), ("block_number", block_number.as_str())])
        .header(CONTENT_LENGTH, content_length)
        .body(body);
        send(Step::UploadChunk, request).await?;
        Ok(())
    }

    pub async fn finish_upload(&self, metadata_id: &str, token: &str) -> Result<()> {
        let url = endpoint(&self.domain, &[UPLOAD_ROUTE, "finished", metadata_id])?;
        let request = self.request(Method::POST, url).query(&[("token", token)]);
        send(Step::FinishUpload, request).await?;
        Ok(())
    }
}

/// Direct access to the blob storage URLs returned for symbol uploads.
///
/// These requests carry none of the App Center API headers.
#[derive(Debug, Clone)]
pub struct BlobStorage {
    client: Client,
}

impl BlobStorage {
    pub async fn put_block_blob(&self, upload_url: &str, blob: RangedBody) -> Result<()> {
        let url = Url::parse(upload_url).map_err(|_| UploadError::InvalidUrl {
            url: upload_url.to_string(),
        })?;
        let content_type = blob.content_type().to_string();
        let content_length = blob.content_length();
        let body = blob.into_body().await?;

        tracing::debug!(%url, content_length, "Uploading blob");
        let request = self
            .client
            .put(url)
            .header(BLOB_TYPE_HEADER, BLOCK_BLOB)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .body(body);
        send(Step::UploadSymbol, request).await?;
        Ok(())
    }
}
