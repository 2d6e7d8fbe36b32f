use crate::config::ConfigError;
use crate::models::ServiceType;
use std::path::PathBuf;

// ============================================================================
// Office Errors
// ============================================================================
//
// Everything here is fatal for the run. Benign races between a queue check
// and the following pickup are not errors and never reach this type.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OfficeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open transcript {path}: {source}")]
    TranscriptOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write transcript line {seq}: {source}")]
    TranscriptWrite { seq: u64, source: std::io::Error },

    #[error("rendezvous channel for service {0} was closed")]
    ChannelClosed(ServiceType),

    #[error("office activity feed is gone")]
    ActivityFeedClosed,

    #[error("actor task failed: {0}")]
    ActorFailed(#[from] tokio::task::JoinError),

    #[error("activity monitor unavailable: {0}")]
    Monitor(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize run report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OfficeError>;
