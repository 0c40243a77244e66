use serde::Serialize;

use crate::notice::Notice;

/// A file that did not make it, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpload {
    pub file_name: String,
    pub message: String,
}

/// Result of one batch. Every file lands in exactly one of the two lists,
/// in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedUpload>,
}

impl UploadOutcome {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record_success(&mut self, file_name: impl Into<String>) {
        self.succeeded.push(file_name.into());
    }

    pub(crate) fn record_failure(&mut self, file_name: impl Into<String>, message: impl Into<String>) {
        self.failed.push(FailedUpload {
            file_name: file_name.into(),
            message: message.into(),
        });
    }

    /// One success notice for the whole batch (if anything went through),
    /// then one error notice per failed file.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::with_capacity(1 + self.failed.len());
        if !self.succeeded.is_empty() {
            notices.push(Notice::success(format!(
                "{} file(s) uploaded",
                self.succeeded.len()
            )));
        }
        notices.extend(
            self.failed
                .iter()
                .map(|f| Notice::error(format!("{}: {}", f.file_name, f.message))),
        );
        notices
    }
}
