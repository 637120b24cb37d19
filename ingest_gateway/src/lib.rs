//! Ingestion gateway core.
//!
//! The gateway is the front door for high-volume, short-lived write traffic.
//! It is responsible for:
//!
//! * Decoding request paths into (endpoint, namespace, identifier) triples.
//! * Structurally validating submission requests before any work is taken
//!   on.
//! * Bounding the number of concurrent in-flight writes per namespace,
//!   shedding load instead of queueing when a namespace is saturated.
//! * Dispatching admitted payloads to the storage backend without blocking
//!   the request-handling workers, and mapping each outcome onto an HTTP
//!   response.
//!
//! The physical storage engine sits behind the
//! [`backend::StorageBackend`] trait; socket setup and process bootstrap are
//! the embedding server runner's concern.

#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(missing_docs, clippy::clone_on_ref_ptr)]
#![allow(clippy::missing_docs_in_private_items)]

pub mod admission;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod path;
pub mod server;
pub mod validate;
