pub mod client;
pub mod error;
pub mod progress;
pub mod ranged_body;
pub mod release;
pub mod rest_types;
mod serde_utils;
pub mod symbols;

pub use client::{ApiFactory, DEFAULT_APPCENTER_BASE_URL};
pub use error::{Step, UploadError};
pub use progress::{NoProgress, ProgressSink};
pub use release::{Pause, ReleaseResult, ReleaseUploader, TokioPause};
pub use symbols::SymbolUploader;
