//! Gateway server entrypoint.

use std::sync::Arc;

use self::http::HttpDelegate;
use crate::{
    admission::AdmissionGate, backend::StorageBackend, config::GatewayConfig,
    dispatch::WriteDispatcher, validate::RequestValidator,
};

pub mod http;

/// A `GatewayServer` owns the assembled request-processing stack for one
/// gateway instance, and hands its HTTP delegate to the embedding server
/// runner - socket binding, TLS and operational endpoints are the runner's
/// concern.
#[derive(Debug)]
pub struct GatewayServer<B> {
    http: HttpDelegate<B>,
}

impl<B> GatewayServer<B>
where
    B: StorageBackend,
{
    /// Assemble the pipeline described by `config` in front of `backend`.
    pub fn new(config: GatewayConfig, backend: Arc<B>) -> Self {
        let validator =
            RequestValidator::new(config.endpoints.iter().cloned(), config.max_payload_bytes);
        let gate = Arc::new(AdmissionGate::new(
            config.namespace_limit,
            config.global_limit,
        ));
        let dispatcher = WriteDispatcher::new(validator, gate, backend, config.write_timeout);

        Self {
            http: HttpDelegate::new(config.max_payload_bytes, dispatcher),
        }
    }

    /// Get a reference to the gateway's HTTP delegate.
    pub fn http(&self) -> &HttpDelegate<B> {
        &self.http
    }
}
