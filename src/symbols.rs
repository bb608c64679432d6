use std::path::Path;

use crate::client::{ApiFactory, AppCenterApi, BlobStorage};
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::ranged_body::RangedBody;
use crate::rest_types::PrepareSymbolUploadRequest;

const CONTENT_TYPE_SYMBOLS: &str = "text/plain; charset=UTF-8";

/// Uploads debug symbol and mapping files for a release.
pub struct SymbolUploader {
    api: AppCenterApi,
    blob_storage: BlobStorage,
    owner_name: String,
    app_name: String,
}

impl SymbolUploader {
    pub fn new(factory: &ApiFactory, owner_name: String, app_name: String) -> Self {
        Self {
            api: factory.app_center(),
            blob_storage: factory.blob_storage(),
            owner_name,
            app_name,
        }
    }

    pub async fn upload_symbols<G>(
        &self,
        mapping_file: &Path,
        symbol_type: &str,
        version_name: &str,
        version_code: &str,
        progress: &G,
    ) -> Result<()>
    where
        G: ProgressSink + ?Sized,
    {
        let owner = self.owner_name.as_str();
        let app = self.app_name.as_str();
        let blob = RangedBody::open(mapping_file, 0, u64::MAX, CONTENT_TYPE_SYMBOLS).await?;

        progress.step("Step 1/3 : Prepare Symbol");
        let request = PrepareSymbolUploadRequest {
            symbol_type: symbol_type.to_string(),
            file_name: mapping_file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            version: version_name.to_string(),
            build: version_code.to_string(),
        };
        let session = self
            .api
            .prepare_symbol_upload(owner, app, &request)
            .await?;
        tracing::info!(owner, app, symbol_upload_id = %session.symbol_upload_id, "Prepared symbol upload");

        progress.step("Step 2/3 : Upload Symbol");
        self.blob_storage
            .put_block_blob(&session.upload_url, blob)
            .await?;

        progress.step("Step 3/3 : Commit Symbol");
        self.api
            .commit_symbol_upload(owner, app, &session.symbol_upload_id)
            .await?;
        tracing::info!(symbol_upload_id = %session.symbol_upload_id, "Symbols committed");

        Ok(())
    }
}
