use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;
use data_types::NamespaceName;
use thiserror::Error;

/// An opaque reference to where a submission was stored, returned to the
/// client on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRef(String);

impl StorageRef {
    /// Wrap a backend-assigned storage location.
    pub fn new(storage_ref: impl Into<String>) -> Self {
        Self(storage_ref.into())
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Errors emitted by a [`StorageBackend`] while persisting a submission.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is (transiently) unable to accept the write.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// An unknown error occurred while persisting the submission.
    #[error("internal storage backend error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

/// An abstract, asynchronous storage backend accepting validated
/// submissions.
///
/// Implementations must be safe to invoke concurrently, and every call must
/// eventually resolve - the dispatch pipeline abandons calls that exceed its
/// write deadline, but still awaits their completion to release the
/// admission capacity they hold.
#[async_trait]
pub trait StorageBackend: Debug + Send + Sync + 'static {
    /// Persist `payload` under `namespace`, keyed by the client-chosen `id`
    /// or by a backend-assigned one when `id` is `None`.
    async fn put(
        &self,
        namespace: &NamespaceName<'static>,
        id: Option<&str>,
        payload: Bytes,
        content_type: &str,
    ) -> Result<StorageRef, BackendError>;
}
