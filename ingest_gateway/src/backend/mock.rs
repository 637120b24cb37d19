//! A recording mock implementation of [`StorageBackend`] for tests.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use data_types::NamespaceName;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::{BackendError, StorageBackend, StorageRef};

/// A call recorded by a [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBackendCall {
    /// The namespace the write was addressed to.
    pub namespace: String,
    /// The client-chosen identifier, if any.
    pub id: Option<String>,
    /// The submitted payload.
    pub payload: Bytes,
    /// The submitted content type.
    pub content_type: String,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<MockBackendCall>,
    put_return: VecDeque<Result<StorageRef, BackendError>>,
}

/// A [`StorageBackend`] mock recording its calls and returning scripted
/// results.
///
/// Calls can optionally be held in flight behind a semaphore, allowing
/// tests to observe the gateway with writes outstanding.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<State>,
    gate: Option<Arc<Semaphore>>,
}

impl MockBackend {
    /// Return the values specified in `ret` in sequence for calls to
    /// `put`, starting from the front.
    pub fn with_put_return(
        self,
        ret: impl Into<VecDeque<Result<StorageRef, BackendError>>>,
    ) -> Self {
        self.state.lock().put_return = ret.into();
        self
    }

    /// Hold every `put` call in flight until a permit is added to `gate`.
    ///
    /// Each added permit releases exactly one held call.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// The calls recorded so far.
    pub fn calls(&self) -> Vec<MockBackendCall> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    async fn put(
        &self,
        namespace: &NamespaceName<'static>,
        id: Option<&str>,
        payload: Bytes,
        content_type: &str,
    ) -> Result<StorageRef, BackendError> {
        // Record the call before (potentially) parking, so tests can observe
        // in-flight writes.
        self.state.lock().calls.push(MockBackendCall {
            namespace: namespace.to_string(),
            id: id.map(ToString::to_string),
            payload,
            content_type: content_type.to_string(),
        });

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("mock gate closed").forget();
        }

        self.state
            .lock()
            .put_return
            .pop_front()
            .expect("no mock value to return for put call")
    }
}
