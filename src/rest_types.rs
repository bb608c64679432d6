use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::serde_utils;

pub const UPLOAD_FINISHED: &str = "uploadFinished";
pub const READY_TO_BE_PUBLISHED: &str = "readyToBePublished";
pub const SYMBOL_COMMITTED: &str = "committed";

#[derive(Debug, Clone, Deserialize)]
pub struct PreparedReleaseUpload {
    pub id: String,
    #[serde(alias = "packageAssetId")]
    pub package_asset_id: String,
    #[serde(alias = "uploadDomain")]
    pub upload_domain: String,
    pub token: String,
}

/// Chunk identifiers are handed back to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChunkId {
    Number(u64),
    Text(String),
}

impl Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkId::Number(n) => write!(f, "{}", n),
            ChunkId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadMetadata {
    pub id: String,
    #[serde(alias = "chunkSize")]
    pub chunk_size: u64,
    #[serde(alias = "chunkList", default)]
    pub chunk_list: Vec<ChunkId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitReleaseUploadRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadStatus {
    #[serde(alias = "uploadStatus")]
    pub upload_status: String,
    #[serde(
        alias = "releaseId",
        alias = "release_distinct_id",
        default,
        deserialize_with = "serde_utils::deserialize_optional_id"
    )]
    pub release_id: Option<String>,
    #[serde(alias = "releaseUrl", default)]
    pub release_url: Option<String>,
}

impl UploadStatus {
    pub fn is_ready(&self) -> bool {
        self.upload_status == READY_TO_BE_PUBLISHED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionRequest {
    pub destinations: Vec<Destination>,
    pub release_notes: String,
    pub notify_testers: bool,
}

impl DistributionRequest {
    pub fn new<S: AsRef<str>>(
        destination_names: &[S],
        release_notes: &str,
        notify_testers: bool,
    ) -> Self {
        Self {
            destinations: destination_names
                .iter()
                .map(|name| Destination {
                    name: name.as_ref().to_string(),
                })
                .collect(),
            release_notes: release_notes.to_string(),
            notify_testers,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareSymbolUploadRequest {
    pub symbol_type: String,
    pub file_name: String,
    pub version: String,
    pub build: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolUploadSession {
    #[serde(alias = "uploadUrl")]
    pub upload_url: String,
    #[serde(alias = "symbolUploadId")]
    pub symbol_upload_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitSymbolUploadRequest {
    pub status: String,
}
