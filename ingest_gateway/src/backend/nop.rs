//! A NOP implementation of [`StorageBackend`].

use async_trait::async_trait;
use bytes::Bytes;
use data_types::NamespaceName;
use tracing::info;

use super::{BackendError, StorageBackend, StorageRef};

/// A [`StorageBackend`] implementation that logs and discards every
/// submission.
///
/// Useful to stand a gateway up before the real backend is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopBackend;

#[async_trait]
impl StorageBackend for NopBackend {
    async fn put(
        &self,
        namespace: &NamespaceName<'static>,
        id: Option<&str>,
        payload: Bytes,
        content_type: &str,
    ) -> Result<StorageRef, BackendError> {
        info!(
            %namespace,
            ?id,
            payload_bytes = payload.len(),
            content_type,
            "dropping submission"
        );
        Ok(StorageRef::new("nop"))
    }
}
