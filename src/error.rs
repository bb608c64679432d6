use std::fmt::Display;
use std::path::PathBuf;

/// The remote call an upload was performing when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PrepareReleaseUpload,
    SetMetadata,
    UploadChunk,
    FinishUpload,
    CommitReleaseUpload,
    GetUpload,
    Distribute,
    PrepareSymbolUpload,
    UploadSymbol,
    CommitSymbolUpload,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::PrepareReleaseUpload => "prepareReleaseUpload",
            Step::SetMetadata => "setMetadata",
            Step::UploadChunk => "uploadChunk",
            Step::FinishUpload => "finishUpload",
            Step::CommitReleaseUpload => "commitReleaseUpload",
            Step::GetUpload => "getUpload",
            Step::Distribute => "distribute",
            Step::PrepareSymbolUpload => "prepareSymbolUpload",
            Step::UploadSymbol => "uploadSymbol",
            Step::CommitSymbolUpload => "commitSymbolUpload",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The backend answered with a non-2xx status
    #[error("{step} failed, code={status}, reason={body}")]
    RemoteCall {
        step: Step,
        status: u16,
        body: String,
    },

    /// The request never produced a usable response
    #[error("{step} failed: {source}")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetching release id: tried {attempts} times")]
    PollTimeout { attempts: u32 },

    #[error("Upload is ready to be published but no release id was returned")]
    MissingReleaseId,

    #[error("Backend returned an invalid chunk size: {size}")]
    InvalidChunkSize { size: u64 },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// The remote call this error is tagged with, if it came from one.
    pub fn step(&self) -> Option<Step> {
        match self {
            UploadError::RemoteCall { step, .. } | UploadError::Transport { step, .. } => {
                Some(*step)
            }
            UploadError::PollTimeout { .. } | UploadError::MissingReleaseId => {
                Some(Step::GetUpload)
            }
            _ => None,
        }
    }

    /// HTTP status of a rejected call.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::RemoteCall { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UploadError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = UploadError> = std::result::Result<T, E>;
