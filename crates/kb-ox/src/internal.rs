use bytes::Bytes;
use kb_ox_common::{
    Body, CommonRequestError, Endpoint, HttpMethod, MultipartForm, RequestBuilder, RequestConfig,
    error::error_from_response,
};
use serde::Serialize;

use crate::{document::Document, error::KnowledgeBaseError};

const LIST_PATH: &str = "documents/list";
const UPLOAD_PATH: &str = "documents/upload";
const DELETE_PATH: &str = "documents/delete";
const ASK_STREAM_PATH: &str = "qa/ask/stream";

/// Multipart field carrying the uploaded file
const UPLOAD_FIELD: &str = "file";

#[derive(Serialize)]
struct DeleteRequest<'a> {
    name: &'a str,
}

/// Knowledge-base endpoint calls on top of the common `RequestBuilder`
#[derive(Debug, Clone)]
pub(crate) struct KbRequestHelper {
    request_builder: RequestBuilder,
}

impl KbRequestHelper {
    pub fn new(client: reqwest::Client, base_url: &str, user_agent: Option<&str>) -> Self {
        let mut config = RequestConfig::new(base_url);
        if let Some(user_agent) = user_agent {
            config = config.with_user_agent(user_agent);
        }

        Self {
            request_builder: RequestBuilder::new(client, config),
        }
    }

    /// Fetch the document list. The status code is not consulted: whatever
    /// the backend sends is parsed as JSON, and `null` means no documents.
    pub async fn list_documents(&self) -> Result<Vec<Document>, KnowledgeBaseError> {
        let endpoint = Endpoint::new(LIST_PATH, HttpMethod::Get);
        let res = self
            .request_builder
            .send(&endpoint, Body::Empty)
            .await
            .map_err(|e| KnowledgeBaseError::ListingUnavailable(e.message()))?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .map_err(|e| KnowledgeBaseError::ListingUnavailable(e.to_string()))?;

        let documents: Option<Vec<Document>> = serde_json::from_slice(&bytes).map_err(|e| {
            KnowledgeBaseError::ListingUnavailable(format!("HTTP {}: {e}", status.as_u16()))
        })?;
        Ok(documents.unwrap_or_default())
    }

    /// Send one file as multipart field `file`.
    pub async fn upload_document(
        &self,
        file_name: &str,
        data: Bytes,
        mime_type: Option<&str>,
    ) -> Result<(), KnowledgeBaseError> {
        let endpoint = Endpoint::new(UPLOAD_PATH, HttpMethod::Post);
        let form = match mime_type {
            Some(mime) => MultipartForm::new().file_from_bytes_with_mime(
                UPLOAD_FIELD,
                file_name,
                data,
                mime,
            )?,
            None => MultipartForm::new().file_from_bytes(UPLOAD_FIELD, file_name, data),
        };

        self.request_builder
            .send_checked(&endpoint, Body::Multipart(form.build()))
            .await
            .map(drop)
            .map_err(|e| match e {
                CommonRequestError::Api { body, .. } => KnowledgeBaseError::UploadRejected(body),
                other => other.into(),
            })
    }

    /// Delete a document by file name. The success body is read and dropped.
    pub async fn delete_document(&self, name: &str) -> Result<(), KnowledgeBaseError> {
        let endpoint = Endpoint::new(DELETE_PATH, HttpMethod::Delete);
        let body = Body::json(&DeleteRequest { name })?;

        self.request_builder
            .request_text(&endpoint, body)
            .await
            .map(drop)
            .map_err(|e| match e {
                CommonRequestError::Api { body, .. } => KnowledgeBaseError::DeleteRejected(body),
                other => other.into(),
            })
    }

    /// Post a question and return the accepted response, ready to stream.
    pub async fn open_answer_stream(
        &self,
        question: &str,
    ) -> Result<reqwest::Response, KnowledgeBaseError> {
        let endpoint = Endpoint::new(ASK_STREAM_PATH, HttpMethod::Post);
        let res = self
            .request_builder
            .send(&endpoint, Body::Text(question.to_string()))
            .await?;

        if !res.status().is_success() {
            let err = error_from_response(res).await;
            return Err(KnowledgeBaseError::QuestionRejected(err.message()));
        }
        if res.status() == reqwest::StatusCode::NO_CONTENT {
            return Err(KnowledgeBaseError::QuestionRejected(
                "response body unavailable".to_string(),
            ));
        }

        Ok(res)
    }
}
