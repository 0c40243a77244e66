use crate::error::{self, CommonRequestError};
use reqwest::{Method, RequestBuilder as ReqwestRequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method for API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Represents an API endpoint with its configuration
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub extra_headers: Option<HashMap<String, String>>,
    pub query_params: Option<Vec<(String, String)>>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            extra_headers: None,
            query_params: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = self.extra_headers.unwrap_or_default();
        headers.insert(key.into(), value.into());
        self.extra_headers = Some(headers);
        self
    }

    pub fn with_query_params(mut self, params: Vec<(String, String)>) -> Self {
        self.query_params = Some(params);
        self
    }
}

/// Configuration for request building
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub base_url: String,
    pub default_headers: HashMap<String, String>,
    pub user_agent: Option<String>,
}

impl RequestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: HashMap::new(),
            user_agent: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Request body variants understood by [`RequestBuilder::send`].
pub enum Body {
    /// No body at all
    Empty,
    /// Serialized as JSON with `content-type: application/json`
    Json(serde_json::Value),
    /// Raw text with `content-type: text/plain`
    Text(String),
    /// Multipart form; reqwest sets the boundary header
    Multipart(reqwest::multipart::Form),
}

impl Body {
    pub fn json<B: Serialize>(body: &B) -> Result<Self, CommonRequestError> {
        Ok(Self::Json(serde_json::to_value(body)?))
    }
}

/// Generic request builder that handles common HTTP patterns
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    config: RequestConfig,
}

impl RequestBuilder {
    pub fn new(client: reqwest::Client, config: RequestConfig) -> Self {
        Self { client, config }
    }

    /// Build a reqwest RequestBuilder for the given endpoint
    pub fn build_request(&self, endpoint: &Endpoint) -> ReqwestRequestBuilder {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.path.trim_start_matches('/')
        );
        let method: Method = endpoint.method.into();

        let mut req = self.client.request(method, &url);

        if let Some(ref params) = endpoint.query_params {
            req = req.query(&params);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if let Some(ref headers) = endpoint.extra_headers {
            for (key, value) in headers {
                req = req.header(key, value);
            }
        }

        if let Some(ref user_agent) = self.config.user_agent {
            req = req.header("user-agent", user_agent);
        }

        req
    }

    /// Send a request and return the raw response, whatever its status.
    pub async fn send(
        &self,
        endpoint: &Endpoint,
        body: Body,
    ) -> Result<Response, CommonRequestError> {
        let req = self.build_request(endpoint);
        let req = match body {
            Body::Empty => req,
            Body::Json(value) => req.json(&value),
            Body::Text(text) => req.header("content-type", "text/plain").body(text),
            Body::Multipart(form) => req.multipart(form),
        };

        log::debug!("{:?} {}", endpoint.method, endpoint.path);
        Ok(req.send().await?)
    }

    /// Send a request and fail with the verbatim body on a non-success status.
    pub async fn send_checked(
        &self,
        endpoint: &Endpoint,
        body: Body,
    ) -> Result<Response, CommonRequestError> {
        let res = self.send(endpoint, body).await?;
        if res.status().is_success() {
            Ok(res)
        } else {
            Err(error::error_from_response(res).await)
        }
    }

    /// Execute a request and return the response text (success bodies only)
    pub async fn request_text(
        &self,
        endpoint: &Endpoint,
        body: Body,
    ) -> Result<String, CommonRequestError> {
        let res = self.send_checked(endpoint, body).await?;
        Ok(res.text().await?)
    }

    /// Execute a request and decode the success body as JSON
    pub async fn request_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &Endpoint,
        body: Body,
    ) -> Result<T, CommonRequestError> {
        let res = self.send_checked(endpoint, body).await?;
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Helper struct for building multipart forms
pub struct MultipartForm {
    form: reqwest::multipart::Form,
}

impl MultipartForm {
    /// Create a new multipart form
    pub fn new() -> Self {
        Self {
            form: reqwest::multipart::Form::new(),
        }
    }

    /// Add a file from bytes
    pub fn file_from_bytes(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<bytes::Bytes>,
    ) -> Self {
        let part = bytes_part(data.into()).file_name(filename.into());
        self.form = self.form.part(name.into(), part);
        self
    }

    /// Add a file from bytes with a MIME type; an unparsable type is rejected.
    pub fn file_from_bytes_with_mime(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<bytes::Bytes>,
        mime_type: &str,
    ) -> Result<Self, CommonRequestError> {
        let part = bytes_part(data.into())
            .file_name(filename.into())
            .mime_str(mime_type)
            .map_err(|_| {
                CommonRequestError::RequestBuilder(format!("invalid MIME type: {mime_type}"))
            })?;
        self.form = self.form.part(name.into(), part);
        Ok(self)
    }

    /// Build the final form
    pub fn build(self) -> reqwest::multipart::Form {
        self.form
    }
}

fn bytes_part(data: bytes::Bytes) -> reqwest::multipart::Part {
    let len = data.len() as u64;
    reqwest::multipart::Part::stream_with_length(data, len)
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}
