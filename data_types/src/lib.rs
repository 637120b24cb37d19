//! This crate contains the data types shared between the ingestion
//! gateway's request-handling layers: validated namespace keys and the
//! immutable submission record produced by request validation.

#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

mod namespace_name;
pub use namespace_name::*;

mod submission;
pub use submission::*;
