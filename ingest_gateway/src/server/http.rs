//! HTTP service implementation for the ingestion gateway.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use hyper::{
    Body, HeaderMap, Request, Response, StatusCode,
    header::{CONTENT_ENCODING, CONTENT_TYPE},
};
use thiserror::Error;
use tracing::trace;

use crate::{backend::StorageBackend, dispatch::WriteDispatcher};

pub mod response;

/// The content type assumed for payloads submitted without one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors returned by the gateway HTTP request handler before a request
/// reaches the dispatch pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The `Content-Encoding` header is invalid and cannot be read.
    #[error("invalid content-encoding header: {0}")]
    NonUtf8ContentHeader(hyper::header::ToStrError),

    /// The specified `Content-Encoding` is not acceptable.
    #[error("unacceptable content-encoding: {0}")]
    InvalidContentEncoding(String),

    /// The client disconnected mid-request.
    #[error("client disconnected")]
    ClientHangup(hyper::Error),

    /// The client sent a request body that exceeds the configured maximum.
    #[error("max request size ({0} bytes) exceeded")]
    RequestSizeExceeded(usize),

    /// Decoding a gzip-compressed stream of data failed.
    #[error("error decoding gzip stream: {0}")]
    InvalidGzip(std::io::Error),
}

impl Error {
    /// Convert the error into an appropriate [`StatusCode`] to be returned
    /// to the end user.
    pub fn as_status_code(&self) -> StatusCode {
        match self {
            Self::ClientHangup(_) => StatusCode::BAD_REQUEST,
            Self::NonUtf8ContentHeader(_) => StatusCode::BAD_REQUEST,
            Self::InvalidContentEncoding(_) => {
                // https://www.rfc-editor.org/rfc/rfc7231#section-6.5.13
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::RequestSizeExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidGzip(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// This type is responsible for servicing requests to the gateway's
/// submission endpoints: it decodes the transport layer (body streaming,
/// size caps, content encoding) and hands the raw request to the
/// [`WriteDispatcher`].
///
/// Requests to some paths may be handled externally by the caller - the
/// embedding server runner takes care of implementing the health endpoint,
/// metrics, etc.
#[derive(Debug)]
pub struct HttpDelegate<B> {
    max_request_bytes: usize,
    dispatcher: WriteDispatcher<B>,
}

impl<B> HttpDelegate<B>
where
    B: StorageBackend,
{
    /// Initialise a new [`HttpDelegate`] passing decoded requests to the
    /// specified `dispatcher`.
    ///
    /// HTTP request bodies are limited to `max_request_bytes` in size,
    /// before and after content decoding, returning an error if exceeded.
    pub fn new(max_request_bytes: usize, dispatcher: WriteDispatcher<B>) -> Self {
        Self {
            max_request_bytes,
            dispatcher,
        }
    }

    /// Route `req` through the submission pipeline, returning the response
    /// mapped from its terminal outcome.
    ///
    /// Transport-level failures short-circuit as [`Error`] before the
    /// pipeline is invoked.
    pub async fn route(&self, req: Request<Body>) -> Result<Response<Body>, Error> {
        let (parts, body) = req.into_parts();

        let content_type = parts
            .headers
            .get(&CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let payload = self.read_body(&parts.headers, body).await?;

        trace!(
            method = %parts.method,
            path = parts.uri.path(),
            payload_bytes = payload.len(),
            "processing submission request"
        );

        let outcome = self
            .dispatcher
            .handle(&parts.method, parts.uri.path(), &content_type, payload)
            .await;

        Ok(response::into_response(outcome))
    }

    /// Parse the request's body into raw bytes, applying the configured
    /// size limits and decoding any content encoding.
    async fn read_body(&self, headers: &HeaderMap, body: Body) -> Result<Bytes, Error> {
        let encoding = headers
            .get(&CONTENT_ENCODING)
            .map(|v| v.to_str().map_err(Error::NonUtf8ContentHeader))
            .transpose()?;
        let ungzip = match encoding {
            None => false,
            Some("gzip") => true,
            Some(v) => return Err(Error::InvalidContentEncoding(v.to_string())),
        };

        let mut payload = body;

        let mut buf = BytesMut::new();
        while let Some(chunk) = payload.next().await {
            let chunk = chunk.map_err(Error::ClientHangup)?;
            // limit max size of in-memory payload
            if (buf.len() + chunk.len()) > self.max_request_bytes {
                return Err(Error::RequestSizeExceeded(self.max_request_bytes));
            }
            buf.extend_from_slice(&chunk);
        }
        let body = buf.freeze();

        // If the body is not compressed, return early.
        if !ungzip {
            return Ok(body);
        }

        // Unzip the gzip-encoded content
        use std::io::Read;
        let decoder = flate2::read::GzDecoder::new(&body[..]);

        // Read at most max_request_bytes bytes to prevent a decompression
        // bomb based DoS.
        //
        // In order to detect if the entire stream has been read, or
        // truncated, read an extra byte beyond the limit and check the
        // resulting data length - see the max_request_size_truncation test.
        let mut decoder = decoder.take(self.max_request_bytes as u64 + 1);
        let mut decoded_data = Vec::new();
        decoder
            .read_to_end(&mut decoded_data)
            .map_err(Error::InvalidGzip)?;

        // If the length is max_size+1, the body is at least max_size+1
        // bytes in length, and possibly longer, but truncated.
        if decoded_data.len() > self.max_request_bytes {
            return Err(Error::RequestSizeExceeded(self.max_request_bytes));
        }

        Ok(decoded_data.into())
    }
}
