#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Client for a document knowledge base with streamed question answering.
//!
//! [`KnowledgeBase`] is the stateless HTTP client. The stateful pieces built
//! on it are [`UploadOrchestrator`] (sequential multi-file uploads with
//! progress), [`AnswerController`] (one live answer stream at a time) and
//! [`DocumentStore`] (the cached document list).

pub mod answer;
pub mod document;
pub mod error;
mod internal;
pub mod notice;
pub mod store;
pub mod upload;

pub use answer::{AnswerController, AnswerExtractor, AnswerSnapshot, AnswerState, ExtractMode};
pub use document::{Document, DocumentSnapshot};
pub use error::KnowledgeBaseError;
pub use notice::{Notice, Severity};
pub use store::DocumentStore;
pub use upload::{
    FailedUpload, FileSelection, UploadFile, UploadOrchestrator, UploadOutcome, UploadPolicy,
    UploadProgress,
};

pub use tokio_util::sync::CancellationToken;

use bon::Builder;
use bytes::Bytes;
use core::fmt;
use futures_util::{StreamExt, stream::BoxStream};

use crate::internal::KbRequestHelper;

const BASE_URL: &str = "http://localhost:8081";

/// Environment variable overriding the backend address
pub const BASE_URL_ENV: &str = "KB_OX_BASE_URL";

#[derive(Clone, Builder)]
pub struct KnowledgeBase {
    #[builder(default)]
    pub(crate) client: reqwest::Client,
    #[builder(default = BASE_URL.to_string(), into)]
    pub(crate) base_url: String,
    #[builder(into)]
    pub(crate) user_agent: Option<String>,
}

impl KnowledgeBase {
    /// Create a client for the default local backend.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a client, taking the backend address from `KB_OX_BASE_URL`
    /// when set.
    pub fn load_from_env() -> Result<Self, std::env::VarError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(base_url) => Ok(Self::builder().base_url(base_url).build()),
            Err(std::env::VarError::NotPresent) => Ok(Self::new()),
            Err(e) => Err(e),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create request helper for internal use
    fn request_helper(&self) -> KbRequestHelper {
        KbRequestHelper::new(
            self.client.clone(),
            &self.base_url,
            self.user_agent.as_deref(),
        )
    }
}

impl KnowledgeBase {
    /// List documents. Any transport or parse failure is reported as
    /// [`KnowledgeBaseError::ListingUnavailable`].
    pub async fn list_documents(&self) -> Result<Vec<Document>, KnowledgeBaseError> {
        self.request_helper().list_documents().await
    }

    /// Upload one document without validation or progress tracking.
    /// See [`UploadOrchestrator`] for batches.
    pub async fn upload_document(
        &self,
        file_name: &str,
        data: impl Into<Bytes>,
        mime_type: Option<&str>,
    ) -> Result<(), KnowledgeBaseError> {
        self.request_helper()
            .upload_document(file_name, data.into(), mime_type)
            .await
    }

    /// Delete a document by file name. The call is made even if the name is
    /// not in any local snapshot.
    pub async fn delete_document(&self, name: &str) -> Result<(), KnowledgeBaseError> {
        self.request_helper().delete_document(name).await
    }

    /// Ask a question and stream the growing answer.
    ///
    /// Every item is the full answer accumulated so far, emitted only when it
    /// grew. A blank question yields a single `EmptyQuestion` error without
    /// touching the network.
    pub fn ask_stream(
        &self,
        question: &str,
        mode: ExtractMode,
    ) -> BoxStream<'static, Result<String, KnowledgeBaseError>> {
        use async_stream::try_stream;

        let helper = self.request_helper();
        let question = question.to_string();

        Box::pin(try_stream! {
            if question.trim().is_empty() {
                Err::<(), _>(KnowledgeBaseError::EmptyQuestion)?;
            }

            let response = helper.open_answer_stream(&question).await?;
            let mut updates = answer::answer_updates(response, mode);
            while let Some(update) = updates.next().await {
                yield update?;
            }
        })
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("client", &self.client)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
