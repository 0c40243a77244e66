use std::time::Duration;

use bon::Builder;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{MAX_UPLOAD_SIZE, UploadFile, UploadOutcome, validate_size};
use crate::{KnowledgeBase, error::KnowledgeBaseError, store::DocumentStore};

const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Limits and timing for upload batches.
#[derive(Debug, Clone, Builder)]
pub struct UploadPolicy {
    /// Largest accepted file in bytes
    #[builder(default = MAX_UPLOAD_SIZE)]
    pub max_file_size: u64,
    /// Pause after the last file before progress is reset
    #[builder(default = DEFAULT_SETTLE_DELAY)]
    pub settle_delay: Duration,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Progress of the running batch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UploadProgress {
    pub uploading: bool,
    /// Percentage in `[0, 100]`
    pub percent: f64,
}

/// Uploads a batch of files one at a time.
///
/// Transfers never overlap. A failing file is recorded and the batch moves
/// on. After the batch, progress is reset and the document snapshot (if a
/// store is attached) is refreshed, whatever the individual outcomes.
#[derive(Debug)]
pub struct UploadOrchestrator {
    client: KnowledgeBase,
    policy: UploadPolicy,
    progress: watch::Sender<UploadProgress>,
    store: Option<DocumentStore>,
}

impl UploadOrchestrator {
    pub fn new(client: KnowledgeBase) -> Self {
        let (progress, _) = watch::channel(UploadProgress::default());
        Self {
            client,
            policy: UploadPolicy::default(),
            progress,
            store: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Refresh this store once every batch completes.
    #[must_use]
    pub fn with_store(mut self, store: DocumentStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> UploadProgress {
        *self.progress.borrow()
    }

    /// Upload `files` in order. Fails only with `NoFilesSelected`; per-file
    /// failures are reported in the outcome.
    pub async fn upload(&self, files: &[UploadFile]) -> Result<UploadOutcome, KnowledgeBaseError> {
        self.upload_with_cancel(files, &CancellationToken::new()).await
    }

    /// Like [`upload`](Self::upload), abandoning the batch when `cancel`
    /// fires. The interrupted file and any not yet started are recorded as
    /// failed with the message `cancelled`.
    pub async fn upload_with_cancel(
        &self,
        files: &[UploadFile],
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome, KnowledgeBaseError> {
        if files.is_empty() {
            log::warn!("upload requested with no files selected");
            return Err(KnowledgeBaseError::NoFilesSelected);
        }

        let total = files.len();
        log::info!("uploading {total} file(s)");
        self.progress.send_replace(UploadProgress {
            uploading: true,
            percent: 0.0,
        });

        let mut outcome = UploadOutcome::default();
        for (index, file) in files.iter().enumerate() {
            let result = if cancel.is_cancelled() {
                Err(KnowledgeBaseError::Cancelled)
            } else {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => Err(KnowledgeBaseError::Cancelled),
                    res = self.upload_file(file, index, total) => res,
                }
            };

            match result {
                Ok(name) => outcome.record_success(name),
                Err(e) => {
                    log::warn!("upload of {} failed: {e}", file.name());
                    outcome.record_failure(file.name(), e.message());
                }
            }
        }

        tokio::time::sleep(self.policy.settle_delay).await;
        self.progress.send_replace(UploadProgress::default());
        log::info!(
            "upload batch finished: {} succeeded, {} failed",
            outcome.succeeded.len(),
            outcome.failed.len()
        );

        if let Some(store) = &self.store {
            store.refresh().await;
        }

        Ok(outcome)
    }

    /// Upload one file of a batch: validate, publish the starting progress,
    /// transfer, publish the finished progress. Returns the file name.
    pub async fn upload_file(
        &self,
        file: &UploadFile,
        index: usize,
        total: usize,
    ) -> Result<String, KnowledgeBaseError> {
        validate_size(file.name(), file.size(), self.policy.max_file_size)?;

        self.advance(percent_of(index, total));

        let data = file.read().await?;
        // A path source may have grown since its metadata was taken.
        validate_size(file.name(), data.len() as u64, self.policy.max_file_size)?;

        self.client
            .upload_document(file.name(), data, file.mime_type())
            .await?;

        self.advance(percent_of(index + 1, total));
        Ok(file.name().to_string())
    }

    /// Raise progress; never lowers it within a batch.
    fn advance(&self, percent: f64) {
        self.progress.send_if_modified(|progress| {
            if percent > progress.percent {
                progress.percent = percent;
                true
            } else {
                false
            }
        });
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
