//! The asynchronous dispatch pipeline tying path decoding, validation,
//! admission control and the storage backend together.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use hyper::Method;
use tokio::time::timeout;
use tracing::{debug, error, trace, warn};

use crate::{
    admission::AdmissionGate,
    backend::{BackendError, StorageBackend, StorageRef},
    path::PathSegments,
    validate::{RejectionReason, RequestValidator},
};

/// The terminal classification of a single request's processing.
///
/// Exactly one `Outcome` is produced per request and consumed exactly once
/// by the response mapper. Collaborators that log or report observe
/// outcomes; they never alter them.
#[derive(Debug)]
pub enum Outcome {
    /// The write was accepted and persisted by the backend.
    Accepted(StorageRef),

    /// The request failed structural validation. Client-caused; never
    /// retried by the gateway.
    Rejected(RejectionReason),

    /// The namespace (or the gateway as a whole) is at its concurrency
    /// ceiling; the caller should retry with backoff.
    Overloaded,

    /// The backend failed to persist the write.
    BackendFailure(BackendError),

    /// The backend did not resolve within the configured deadline. The
    /// write may still complete; the gateway does not re-issue it, to avoid
    /// duplicates.
    TimedOut,
}

/// The asynchronous orchestrator processing each submission request through
/// to a terminal [`Outcome`].
///
/// Each request moves through the pipeline states in order, never
/// revisiting one:
///
/// ```text
///   Received ─▶ Decoded ─▶ Validated ─▶ Admitted ─▶ Dispatched ─┬▶ Succeeded
///                              │            │                   ├▶ Failed
///                              ▼            ▼                   └▶ TimedOut
///                           Rejected    Overloaded
/// ```
///
/// The backend write runs as a detached task owning the request's
/// [`AdmissionToken`](crate::admission::AdmissionToken): a deadline or a
/// client disconnect never cancels an issued write (preserving
/// at-least-once semantics), and the token is released when the write
/// resolves - however late that is.
#[derive(Debug)]
pub struct WriteDispatcher<B> {
    validator: RequestValidator,
    gate: Arc<AdmissionGate>,
    backend: Arc<B>,
    write_timeout: Duration,
}

impl<B> WriteDispatcher<B>
where
    B: StorageBackend,
{
    /// Initialise a dispatcher admitting requests through `gate` and
    /// writing them to `backend`, with each write bounded by
    /// `write_timeout`.
    pub fn new(
        validator: RequestValidator,
        gate: Arc<AdmissionGate>,
        backend: Arc<B>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            gate,
            backend,
            write_timeout,
        }
    }

    /// Process one submission request through to a terminal [`Outcome`].
    ///
    /// This call suspends while the backend write is in flight; it never
    /// blocks the calling worker.
    pub async fn handle(
        &self,
        method: &Method,
        raw_path: &str,
        content_type: &str,
        payload: Bytes,
    ) -> Outcome {
        let segments = PathSegments::decode(raw_path);

        let request = match self
            .validator
            .validate(method, &segments, content_type, payload)
        {
            Ok(v) => v,
            Err(reason) => {
                debug!(%reason, path = raw_path, "rejecting submission");
                return Outcome::Rejected(reason);
            }
        };

        // No admission is attempted for invalid requests; conversely a
        // denied admission resolves immediately, without touching the
        // backend.
        let token = match self.gate.try_admit(request.namespace()) {
            Some(v) => v,
            None => {
                warn!(
                    namespace = %request.namespace(),
                    "namespace at concurrency ceiling, shedding write"
                );
                return Outcome::Overloaded;
            }
        };

        trace!(
            namespace = %request.namespace(),
            endpoint = request.endpoint(),
            "dispatching write"
        );

        // The write runs as its own task so the deadline below never
        // cancels it: an abandoned request still runs to completion in the
        // backend, and the admission token it owns is released when it
        // resolves.
        let backend = Arc::clone(&self.backend);
        let write = tokio::spawn(async move {
            let _token = token;
            backend
                .put(
                    request.namespace(),
                    request.id(),
                    request.payload().clone(),
                    request.content_type(),
                )
                .await
        });

        match timeout(self.write_timeout, write).await {
            Ok(Ok(Ok(storage_ref))) => Outcome::Accepted(storage_ref),
            Ok(Ok(Err(e))) => {
                error!(error = %e, "backend write failed");
                Outcome::BackendFailure(e)
            }
            Ok(Err(e)) => {
                // The write task itself died (panicked or was aborted).
                error!(error = %e, "backend write task died");
                Outcome::BackendFailure(BackendError::Internal(Box::new(e)))
            }
            Err(_) => {
                warn!("backend write exceeded deadline, abandoning request");
                Outcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use assert_matches::assert_matches;
    use data_types::NamespaceName;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::backend::mock::{MockBackend, MockBackendCall};

    const MAX_BYTES: usize = 1024;
    const NAMESPACE_LIMIT: usize = 1;

    fn dispatcher(
        backend: Arc<MockBackend>,
        write_timeout: Duration,
    ) -> (Arc<WriteDispatcher<MockBackend>>, Arc<AdmissionGate>) {
        let gate = Arc::new(AdmissionGate::new(
            NonZeroUsize::new(NAMESPACE_LIMIT).unwrap(),
            None,
        ));
        let dispatcher = WriteDispatcher::new(
            RequestValidator::new(["submit".to_string()], MAX_BYTES),
            Arc::clone(&gate),
            backend,
            write_timeout,
        );
        (Arc::new(dispatcher), gate)
    }

    /// Poll `predicate` until it holds, panicking after 5 seconds.
    async fn wait_for(predicate: impl Fn() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !predicate() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition was not reached in time");
    }

    #[test_log::test(tokio::test)]
    async fn test_accepted() {
        let backend = Arc::new(
            MockBackend::default().with_put_return([Ok(StorageRef::new("object/42"))]),
        );
        let (dispatcher, gate) = dispatcher(Arc::clone(&backend), Duration::from_secs(5));

        let got = dispatcher
            .handle(
                &Method::POST,
                "/submit/bananas/platanos",
                "application/json",
                Bytes::from_static(b"{}"),
            )
            .await;

        assert_matches!(got, Outcome::Accepted(r) => {
            assert_eq!(r.as_str(), "object/42");
        });
        assert_matches!(backend.calls().as_slice(), [MockBackendCall { namespace, id, .. }] => {
            assert_eq!(namespace, "bananas");
            assert_eq!(id.as_deref(), Some("platanos"));
        });

        // The token must be released once the outcome is produced.
        let ns = NamespaceName::new("bananas").unwrap();
        wait_for(|| gate.in_flight(&ns) == 0).await;
    }

    #[test_log::test(tokio::test)]
    async fn test_rejected_without_admission() {
        let backend = Arc::new(MockBackend::default());
        let (dispatcher, gate) = dispatcher(Arc::clone(&backend), Duration::from_secs(5));

        let got = dispatcher
            .handle(
                &Method::GET,
                "/submit/bananas",
                "application/json",
                Bytes::new(),
            )
            .await;

        assert_matches!(got, Outcome::Rejected(RejectionReason::MethodNotAllowed(_)));

        // A rejected request must neither reach the backend nor claim
        // admission capacity.
        assert!(backend.calls().is_empty());
        assert_eq!(gate.in_flight(&NamespaceName::new("bananas").unwrap()), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_overloaded_sheds_second_write() {
        let hold = Arc::new(Semaphore::new(0));
        let backend = Arc::new(
            MockBackend::default()
                .with_put_return([Ok(StorageRef::new("object/1"))])
                .with_gate(Arc::clone(&hold)),
        );
        let (dispatcher, _gate) = dispatcher(Arc::clone(&backend), Duration::from_secs(5));

        // Park the first write inside the backend.
        let first = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .handle(
                        &Method::POST,
                        "/submit/bananas",
                        "application/json",
                        Bytes::from_static(b"1"),
                    )
                    .await
            })
        };
        {
            let backend = Arc::clone(&backend);
            wait_for(move || backend.calls().len() == 1).await;
        }

        // With a namespace limit of 1, a concurrent second write to the
        // same namespace must be shed immediately.
        let got = dispatcher
            .handle(
                &Method::POST,
                "/submit/bananas",
                "application/json",
                Bytes::from_static(b"2"),
            )
            .await;
        assert_matches!(got, Outcome::Overloaded);

        // Release the parked write and observe it complete normally.
        hold.add_permits(1);
        let got = first.await.expect("dispatch task panicked");
        assert_matches!(got, Outcome::Accepted(_));
    }

    #[test_log::test(tokio::test)]
    async fn test_backend_failure_releases_token() {
        let backend = Arc::new(MockBackend::default().with_put_return([Err(
            BackendError::Unavailable("queue full".to_string()),
        )]));
        let (dispatcher, gate) = dispatcher(Arc::clone(&backend), Duration::from_secs(5));

        let got = dispatcher
            .handle(
                &Method::POST,
                "/submit/bananas",
                "application/json",
                Bytes::from_static(b"{}"),
            )
            .await;

        assert_matches!(got, Outcome::BackendFailure(BackendError::Unavailable(_)));

        let ns = NamespaceName::new("bananas").unwrap();
        wait_for(|| gate.in_flight(&ns) == 0).await;
    }

    #[test_log::test(tokio::test)]
    async fn test_timeout_releases_token_on_late_completion() {
        let hold = Arc::new(Semaphore::new(0));
        let backend = Arc::new(
            MockBackend::default()
                .with_put_return([Ok(StorageRef::new("object/1"))])
                .with_gate(Arc::clone(&hold)),
        );
        let (dispatcher, gate) = dispatcher(Arc::clone(&backend), Duration::from_millis(20));

        let got = dispatcher
            .handle(
                &Method::POST,
                "/submit/bananas",
                "application/json",
                Bytes::from_static(b"{}"),
            )
            .await;

        // The deadline elapsed with the backend still holding the write.
        assert_matches!(got, Outcome::TimedOut);

        // The write is still in flight, so its admission capacity must
        // still be claimed.
        let ns = NamespaceName::new("bananas").unwrap();
        assert_eq!(gate.in_flight(&ns), 1);

        // Once the backend finally resolves, the (discarded) late result
        // must release the token.
        hold.add_permits(1);
        wait_for(|| gate.in_flight(&ns) == 0).await;
    }
}
