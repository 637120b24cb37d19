//! Gateway runtime configuration.

use std::{collections::BTreeSet, num::NonZeroUsize, time::Duration};

use serde::Deserialize;

/// Default cap on request payload sizes, in bytes.
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default per-namespace in-flight write ceiling.
const DEFAULT_NAMESPACE_LIMIT: NonZeroUsize = NonZeroUsize::new(128).unwrap();

/// Default deadline for a single backend write.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration for a gateway instance.
///
/// Deserialisable so the embedding process can source it from whatever
/// configuration layer it runs; every field carries a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Endpoint names accepted as the first path segment.
    ///
    /// Empty by default: every submission is rejected as addressed to an
    /// unknown endpoint until the allow-list is populated.
    pub endpoints: BTreeSet<String>,

    /// Maximum accepted payload size in bytes, enforced both while reading
    /// the request body and again after content decoding.
    pub max_payload_bytes: usize,

    /// Maximum number of concurrent in-flight writes per namespace.
    pub namespace_limit: NonZeroUsize,

    /// Optional ceiling on in-flight writes across all namespaces.
    pub global_limit: Option<NonZeroUsize>,

    /// Deadline for a single backend write.
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoints: BTreeSet::new(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            namespace_limit: DEFAULT_NAMESPACE_LIMIT,
            global_limit: None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}
