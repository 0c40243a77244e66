use thiserror::Error;

/// Common errors that can occur in knowledge-base HTTP requests
#[derive(Error, Debug)]
pub enum CommonRequestError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O failed while preparing a request body
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend answered with a non-success status.
    ///
    /// `body` is the response text exactly as sent; the backend's wording is
    /// what gets shown to the user.
    #[error("{body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Error originating from the request builder
    #[error("Request builder error: {0}")]
    RequestBuilder(String),
}

impl CommonRequestError {
    /// Status code of a backend rejection, if this is one.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// The message to surface for this error. Backend rejections yield their
    /// body verbatim; transport failures their display form.
    pub fn message(&self) -> String {
        match self {
            Self::Api { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Parse error response from HTTP status and body.
///
/// The body is kept as-is (lossy UTF-8); no JSON unwrapping is attempted
/// because the backend reports failures as plain text.
pub fn parse_error_response(status: reqwest::StatusCode, body: &bytes::Bytes) -> CommonRequestError {
    CommonRequestError::Api {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

/// Read the remaining body of a rejected response into an error.
pub async fn error_from_response(response: reqwest::Response) -> CommonRequestError {
    let status = response.status();
    match response.bytes().await {
        Ok(bytes) => parse_error_response(status, &bytes),
        Err(e) => CommonRequestError::Http(e),
    }
}
