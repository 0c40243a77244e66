//! Sequential multi-file uploads: size validation, per-file transfer,
//! progress and outcome aggregation.

mod file;
mod orchestrator;
mod outcome;

pub use file::{FileSelection, FileType, SUPPORTED_FILE_TYPES, UploadFile, UploadSource};
pub use orchestrator::{UploadOrchestrator, UploadPolicy, UploadProgress};
pub use outcome::{FailedUpload, UploadOutcome};

use crate::error::KnowledgeBaseError;

/// Largest accepted upload, in bytes (100 MiB).
pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Check one file against the size ceiling. Sizes equal to `max` pass.
pub fn validate_size(file_name: &str, size: u64, max: u64) -> Result<(), KnowledgeBaseError> {
    if size > max {
        return Err(KnowledgeBaseError::FileTooLarge {
            file_name: file_name.to_string(),
            size,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_at_limit_passes() {
        assert!(validate_size("edge.bin", MAX_UPLOAD_SIZE, MAX_UPLOAD_SIZE).is_ok());
    }

    #[test]
    fn one_byte_over_limit_fails_naming_file() {
        let err = validate_size("edge.bin", MAX_UPLOAD_SIZE + 1, MAX_UPLOAD_SIZE).unwrap_err();
        match err {
            KnowledgeBaseError::FileTooLarge { file_name, size, max } => {
                assert_eq!(file_name, "edge.bin");
                assert_eq!(size, MAX_UPLOAD_SIZE + 1);
                assert_eq!(max, MAX_UPLOAD_SIZE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_file_passes() {
        assert!(validate_size("empty.txt", 0, MAX_UPLOAD_SIZE).is_ok());
    }
}
