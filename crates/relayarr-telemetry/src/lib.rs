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

//! Logging primitives shared across the relayarr workspace.
//!
//! This crate owns subscriber installation and the per-event span so every crate logs
//! through the same filter and format.

pub mod context;
pub mod error;
pub mod init;

pub use context::{event_span, record_executor};
pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LOG_FILE_PREFIX, LogFormat, LoggingConfig, TelemetryGuard, build_version,
    init_logging,
};
