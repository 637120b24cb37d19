//! Structural validation of submission requests.

use bytes::Bytes;
use chrono::Utc;
use data_types::{NamespaceName, NamespaceNameError, SubmissionRequest};
use hashbrown::HashSet;
use hyper::Method;
use thiserror::Error;

use crate::path::PathSegments;

/// Reasons a submission request is rejected before admission.
///
/// Rejections are always client-caused; the gateway never retries them.
#[derive(Debug, Error)]
pub enum RejectionReason {
    /// The request method is not a write verb.
    #[error("method {0} is not allowed for submissions")]
    MethodNotAllowed(Method),

    /// The path does not carry at least an endpoint and a namespace.
    #[error("path must be of the form /{{endpoint}}/{{namespace}}[/{{id}}]")]
    MalformedPath,

    /// The endpoint segment does not name a configured endpoint.
    #[error("unknown endpoint {0}")]
    UnknownEndpoint(String),

    /// The namespace segment is not a well-formed namespace name.
    #[error("invalid namespace: {0}")]
    InvalidNamespace(NamespaceNameError),

    /// The identifier segment is not a well-formed identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(NamespaceNameError),

    /// The payload exceeds the configured maximum size.
    #[error("maximum payload size ({0} bytes) exceeded")]
    PayloadTooLarge(usize),
}

impl RejectionReason {
    /// The short machine-readable code included in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::MalformedPath => "malformed_path",
            Self::UnknownEndpoint(_) => "unknown_endpoint",
            Self::InvalidNamespace(_) => "invalid_namespace",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::PayloadTooLarge(_) => "payload_too_large",
        }
    }
}

/// Applies the structural admission rules to decoded submission requests,
/// producing an immutable [`SubmissionRequest`] or the first
/// [`RejectionReason`] encountered.
///
/// Validation is purely local - no network or storage access - and safe for
/// concurrent invocation.
#[derive(Debug)]
pub struct RequestValidator {
    endpoints: HashSet<String>,
    max_payload_bytes: usize,
}

impl RequestValidator {
    /// Initialise a validator accepting submissions addressed to
    /// `endpoints`, with payloads of at most `max_payload_bytes`.
    pub fn new(endpoints: impl IntoIterator<Item = String>, max_payload_bytes: usize) -> Self {
        Self {
            endpoints: endpoints.into_iter().collect(),
            max_payload_bytes,
        }
    }

    /// Validate one request, applying the rules in order with the first
    /// failure winning:
    ///
    /// 1. the method must be a write verb (POST or PUT)
    /// 2. the path must carry at least an endpoint and a namespace
    /// 3. the endpoint must belong to the configured allow-list
    /// 4. the namespace must be a well-formed [`NamespaceName`]
    /// 5. the identifier, if present, must satisfy the same syntax; an
    ///    absent identifier means "server-assigned id" and is valid
    /// 6. the payload must not exceed the configured maximum
    pub fn validate(
        &self,
        method: &Method,
        segments: &PathSegments,
        content_type: &str,
        payload: Bytes,
    ) -> Result<SubmissionRequest, RejectionReason> {
        if !matches!(*method, Method::POST | Method::PUT) {
            return Err(RejectionReason::MethodNotAllowed(method.clone()));
        }

        let (endpoint, namespace) = match (segments.endpoint(), segments.namespace()) {
            (Some(endpoint), Some(namespace)) => (endpoint, namespace),
            _ => return Err(RejectionReason::MalformedPath),
        };

        if !self.endpoints.contains(endpoint) {
            return Err(RejectionReason::UnknownEndpoint(endpoint.to_string()));
        }

        let namespace = NamespaceName::new(namespace.to_string())
            .map_err(RejectionReason::InvalidNamespace)?;

        let id = match segments.id() {
            Some(id) => {
                // Client-chosen identifiers share the namespace syntax rules.
                NamespaceName::new(id.to_string()).map_err(RejectionReason::InvalidIdentifier)?;
                Some(id.to_string())
            }
            None => None,
        };

        if payload.len() > self.max_payload_bytes {
            return Err(RejectionReason::PayloadTooLarge(self.max_payload_bytes));
        }

        Ok(SubmissionRequest::new(
            endpoint.to_string(),
            namespace,
            id,
            payload,
            content_type.to_string(),
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const MAX_BYTES: usize = 1024;

    fn validator() -> RequestValidator {
        RequestValidator::new(["submit".to_string(), "events".to_string()], MAX_BYTES)
    }

    fn validate(
        method: Method,
        path: &str,
        payload: &'static [u8],
    ) -> Result<SubmissionRequest, RejectionReason> {
        validator().validate(
            &method,
            &PathSegments::decode(path),
            "application/octet-stream",
            Bytes::from_static(payload),
        )
    }

    #[test]
    fn test_ok_with_id() {
        let got = validate(Method::POST, "/submit/ns1/id1", b"bananas").unwrap();

        assert_eq!(got.endpoint(), "submit");
        assert_eq!(got.namespace().as_str(), "ns1");
        assert_eq!(got.id(), Some("id1"));
        assert_eq!(got.payload().as_ref(), b"bananas");
    }

    #[test]
    fn test_ok_server_assigned_id() {
        let got = validate(Method::PUT, "/events/ns1", b"bananas").unwrap();

        assert_eq!(got.id(), None);
    }

    #[test]
    fn test_method_not_allowed() {
        let got = validate(Method::GET, "/submit/ns1/id1", b"").unwrap_err();
        assert_matches!(got, RejectionReason::MethodNotAllowed(m) => {
            assert_eq!(m, Method::GET);
        });

        let got = validate(Method::DELETE, "/submit/ns1", b"").unwrap_err();
        assert_matches!(got, RejectionReason::MethodNotAllowed(_));
    }

    // Rule 1 wins over everything else: a read of a nonsense path reports
    // the method, not the path.
    #[test]
    fn test_rule_order_method_first() {
        let got = validate(Method::GET, "/", b"").unwrap_err();

        assert_matches!(got, RejectionReason::MethodNotAllowed(_));
    }

    #[test]
    fn test_malformed_path() {
        let got = validate(Method::POST, "/submit", b"bananas").unwrap_err();
        assert_matches!(got, RejectionReason::MalformedPath);

        let got = validate(Method::POST, "/", b"bananas").unwrap_err();
        assert_matches!(got, RejectionReason::MalformedPath);

        let got = validate(Method::POST, "", b"bananas").unwrap_err();
        assert_matches!(got, RejectionReason::MalformedPath);
    }

    #[test]
    fn test_unknown_endpoint() {
        let got = validate(Method::POST, "/bananas/ns1", b"").unwrap_err();

        assert_matches!(got, RejectionReason::UnknownEndpoint(e) => {
            assert_eq!(e, "bananas");
        });
    }

    #[test]
    fn test_invalid_namespace() {
        let got = validate(Method::POST, "/submit/ns!1", b"").unwrap_err();

        assert_matches!(got, RejectionReason::InvalidNamespace(_));
    }

    #[test]
    fn test_invalid_identifier() {
        let got = validate(Method::POST, "/submit/ns1/id!1", b"").unwrap_err();

        assert_matches!(got, RejectionReason::InvalidIdentifier(_));
    }

    #[test]
    fn test_payload_too_large() {
        let validator = RequestValidator::new(["submit".to_string()], 8);
        let got = validator
            .validate(
                &Method::POST,
                &PathSegments::decode("/submit/ns1"),
                "application/octet-stream",
                Bytes::from_static(b"012345678"),
            )
            .unwrap_err();

        assert_matches!(got, RejectionReason::PayloadTooLarge(8));
    }

    #[test]
    fn test_payload_at_limit() {
        let validator = RequestValidator::new(["submit".to_string()], 8);
        let got = validator.validate(
            &Method::POST,
            &PathSegments::decode("/submit/ns1"),
            "application/octet-stream",
            Bytes::from_static(b"01234567"),
        );

        assert_matches!(got, Ok(_));
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectionReason::MalformedPath.code(), "malformed_path");
        assert_eq!(
            RejectionReason::MethodNotAllowed(Method::GET).code(),
            "method_not_allowed"
        );
        assert_eq!(RejectionReason::PayloadTooLarge(1).code(), "payload_too_large");
    }
}
