use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::NamespaceName;

/// A validated data submission.
///
/// Instances are created by the gateway's request validator once a request
/// has passed every structural check, and are immutable from then on. Each
/// instance is owned exclusively by the dispatch invocation that created it
/// and is discarded once the response is sent; it is never shared across
/// concurrent requests.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    endpoint: String,
    namespace: NamespaceName<'static>,
    id: Option<String>,
    payload: Bytes,
    content_type: String,
    received_at: DateTime<Utc>,
}

impl SubmissionRequest {
    /// Assemble a submission record from already-validated parts.
    pub fn new(
        endpoint: String,
        namespace: NamespaceName<'static>,
        id: Option<String>,
        payload: Bytes,
        content_type: String,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            endpoint,
            namespace,
            id,
            payload,
            content_type,
            received_at,
        }
    }

    /// The endpoint this submission was addressed to, selecting the logical
    /// data stream it belongs to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The namespace the submission belongs to.
    pub fn namespace(&self) -> &NamespaceName<'static> {
        &self.namespace
    }

    /// The client-chosen identifier, if one was supplied.
    ///
    /// `None` means the storage backend assigns one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The raw submission payload.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The `Content-Type` the payload was submitted with.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The instant the gateway accepted the request for processing.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let now = Utc::now();
        let got = SubmissionRequest::new(
            "submit".to_string(),
            NamespaceName::new("bananas").unwrap(),
            Some("platanos".to_string()),
            Bytes::from_static(b"42"),
            "application/json".to_string(),
            now,
        );

        assert_eq!(got.endpoint(), "submit");
        assert_eq!(got.namespace().as_str(), "bananas");
        assert_eq!(got.id(), Some("platanos"));
        assert_eq!(got.payload().as_ref(), b"42");
        assert_eq!(got.content_type(), "application/json");
        assert_eq!(got.received_at(), now);
    }

    #[test]
    fn test_server_assigned_id() {
        let got = SubmissionRequest::new(
            "submit".to_string(),
            NamespaceName::new("bananas").unwrap(),
            None,
            Bytes::new(),
            "application/octet-stream".to_string(),
            Utc::now(),
        );

        assert_eq!(got.id(), None);
    }
}
