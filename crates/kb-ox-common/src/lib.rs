#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Shared HTTP plumbing for the knowledge-base client
//!
//! Request construction, backend error parsing and incremental decoding of
//! streamed response bodies.

pub mod error;
pub mod request_builder;
pub mod streaming;

pub use error::CommonRequestError;
pub use request_builder::{Body, Endpoint, HttpMethod, MultipartForm, RequestBuilder, RequestConfig};
pub use streaming::{TextChunkReader, Utf8ChunkDecoder};

/// Re-export common types for convenience
pub use futures_util::stream::BoxStream;
pub use serde::{Deserialize, Serialize};
