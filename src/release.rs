//! Release upload: prepare, stream the package in chunks, commit, wait for
//! the backend to process it, then distribute it to tester groups.

use std::future::Future;
use std::ops::Range;
use std::path::Path;
use std::time::Duration;

use crate::client::{ApiFactory, AppCenterApi};
use crate::error::{Result, UploadError};
use crate::progress::ProgressSink;
use crate::ranged_body::RangedBody;
use crate::rest_types::DistributionRequest;

pub const CONTENT_TYPE_APK: &str = "application/vnd.android.package-archive";
const CONTENT_TYPE_CHUNK: &str = "application/octet-stream";

pub const POLL_INTERVAL: Duration = Duration::from_millis(1_000);
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Waits between two polls of the upload status.
pub trait Pause {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResult {
    pub release_id: String,
    pub release_url: Option<String>,
}

/// Byte range of chunk `index`, clamped to the file length.
pub fn chunk_range(index: u64, chunk_size: u64, file_len: u64) -> Range<u64> {
    let start = index.saturating_mul(chunk_size).min(file_len);
    let end = start.saturating_add(chunk_size).min(file_len);
    start..end
}

/// Every chunk range of a file, in upload order.
pub fn chunk_ranges(file_len: u64, chunk_size: u64) -> Vec<Range<u64>> {
    if chunk_size == 0 {
        return Vec::new();
    }
    (0..file_len.div_ceil(chunk_size))
        .map(|index| chunk_range(index, chunk_size, file_len))
        .collect()
}

pub struct ReleaseUploader<P = TokioPause> {
    factory: ApiFactory,
    api: AppCenterApi,
    owner_name: String,
    app_name: String,
    pause: P,
}

impl ReleaseUploader<TokioPause> {
    pub fn new(factory: ApiFactory, owner_name: String, app_name: String) -> Self {
        Self {
            api: factory.app_center(),
            factory,
            owner_name,
            app_name,
            pause: TokioPause,
        }
    }
}

impl<P: Pause> ReleaseUploader<P> {
    /// Replaces how the uploader waits between status polls.
    pub fn with_pause<Q: Pause>(self, pause: Q) -> ReleaseUploader<Q> {
        ReleaseUploader {
            factory: self.factory,
            api: self.api,
            owner_name: self.owner_name,
            app_name: self.app_name,
            pause,
        }
    }

    /// Uploads `file` as a new release and distributes it to `destination_names`.
    ///
    /// Each step starts only once the previous remote call succeeded; the first
    /// failure ends the whole upload. Nothing is retried or resumed.
    pub async fn upload_release<S, G>(
        &self,
        file: &Path,
        change_log: &str,
        destination_names: &[S],
        notify_testers: bool,
        progress: &G,
    ) -> Result<ReleaseResult>
    where
        S: AsRef<str>,
        G: ProgressSink + ?Sized,
    {
        let owner = self.owner_name.as_str();
        let app = self.app_name.as_str();
        let file_len = tokio::fs::metadata(file)
            .await
            .map_err(|e| UploadError::io(file, e))?
            .len();
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        progress.step("Step 1/7 : Prepare Release Upload");
        let prepared = self.api.prepare_release_upload(owner, app).await?;
        tracing::info!(owner, app, upload_id = %prepared.id, "Prepared release upload");

        progress.step("Step 2/7 : Setting Metadata");
        let upload_api = self.factory.upload_api(&prepared.upload_domain)?;
        let metadata = upload_api
            .set_metadata(
                &prepared.package_asset_id,
                &file_name,
                file_len,
                &prepared.token,
                CONTENT_TYPE_APK,
            )
            .await?;
        if metadata.chunk_size == 0 {
            return Err(UploadError::InvalidChunkSize { size: 0 });
        }

        progress.step("Step 3/7 : Upload Release Chunks");
        let expected_chunks = file_len.div_ceil(metadata.chunk_size);
        if metadata.chunk_list.len() as u64 != expected_chunks {
            tracing::warn!(
                expected = expected_chunks,
                received = metadata.chunk_list.len(),
                "Chunk list does not match file size"
            );
        }
        for (index, chunk_id) in metadata.chunk_list.iter().enumerate() {
            let range = chunk_range(index as u64, metadata.chunk_size, file_len);
            tracing::debug!(%chunk_id, start = range.start, end = range.end, "Uploading chunk");
            let chunk = RangedBody::new(
                file,
                file_len,
                range.start,
                metadata.chunk_size,
                CONTENT_TYPE_CHUNK,
            );
            upload_api
                .upload_chunk(&prepared.package_asset_id, chunk_id, &prepared.token, chunk)
                .await?;
        }

        progress.step("Step 4/7 : Finish Upload");
        upload_api.finish_upload(&metadata.id, &prepared.token).await?;

        progress.step("Step 5/7 : Commit Release");
        self.api
            .commit_release_upload(owner, app, &prepared.id)
            .await?;

        progress.step("Step 6/7 : Fetching Release Id");
        let mut attempts = 0;
        let status = loop {
            let status = self.api.get_upload(owner, app, &prepared.id).await?;
            self.pause.pause(POLL_INTERVAL).await;
            attempts += 1;
            if attempts >= MAX_POLL_ATTEMPTS {
                return Err(UploadError::PollTimeout { attempts });
            }
            if status.is_ready() {
                break status;
            }
            tracing::debug!(attempts, upload_status = %status.upload_status, "Release not ready yet");
        };
        let release_id = status.release_id.ok_or(UploadError::MissingReleaseId)?;
        tracing::info!(
            release_id = %release_id,
            release_url = status.release_url.as_deref().unwrap_or("<none>"),
            "Release is ready to be published"
        );

        progress.step("Step 7/7 : Distribute Release");
        let request = DistributionRequest::new(destination_names, change_log, notify_testers);
        self.api.distribute(owner, app, &release_id, &request).await?;
        tracing::info!(
            release_id = %release_id,
            destinations = request.destinations.len(),
            "Release distributed"
        );

        Ok(ReleaseResult {
            release_id,
            release_url: status.release_url,
        })
    }
}
