#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Library-change events relayed from the media manager.
//!
//! Layout: `payloads.rs` (typed event enum and kinds), `ingress.rs` (normalisation of the
//! custom-script environment into events), `error.rs` (ingress failures).

pub mod error;
pub mod ingress;
pub mod payloads;

pub use error::{IngressError, IngressResult};
pub use ingress::SonarrEnvironment;
pub use payloads::{DeleteReason, EventKind, LibraryEvent, Series};
