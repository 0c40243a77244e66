use kb_ox_common::CommonRequestError;
use thiserror::Error;

use crate::notice::Severity;

/// Errors produced by the knowledge-base client.
///
/// File-level upload failures (`FileTooLarge`, `UploadRejected`) are collected
/// into an [`UploadOutcome`](crate::upload::UploadOutcome) instead of aborting
/// a batch; listing failures are folded into an empty snapshot by
/// [`DocumentStore`](crate::store::DocumentStore). Everything else reaches the
/// caller.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// The file exceeds the upload size ceiling; nothing was sent.
    #[error("{file_name} is too large, maximum supported size is {} MB", .max / (1024 * 1024))]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },

    /// The backend refused one file. Holds its response body verbatim.
    #[error("{0}")]
    UploadRejected(String),

    /// An upload was requested with an empty selection.
    #[error("no files selected")]
    NoFilesSelected,

    /// The document list could not be fetched or parsed.
    #[error("document listing unavailable: {0}")]
    ListingUnavailable(String),

    /// The backend refused a delete. Holds its response body verbatim.
    #[error("{0}")]
    DeleteRejected(String),

    /// A question was blank after trimming.
    #[error("question is empty")]
    EmptyQuestion,

    /// The question request failed before any answer data arrived.
    #[error("{0}")]
    QuestionRejected(String),

    /// Reading the answer stream failed midway.
    #[error("stream read failed: {0}")]
    StreamRead(String),

    /// The operation was abandoned through its cancellation token.
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Request(#[from] CommonRequestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KnowledgeBaseError {
    /// User-input preconditions are warnings; everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            Self::NoFilesSelected | Self::EmptyQuestion => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Text to show the user. Backend rejections are passed through as sent.
    pub fn message(&self) -> String {
        match self {
            Self::Request(e) => e.message(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
