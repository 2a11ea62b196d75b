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

//! Relay of Sonarr library events to Kodi hosts that share one library database.
//!
//! Layout: `bootstrap.rs` (process wiring), `cli.rs` (arguments), `orchestrator.rs` (per-event
//! pipeline), `plan.rs` (event to action mapping), `executor.rs` (library work on one host),
//! `registry.rs` (host pool and probing), plus the helpers the pipeline is built from.

/// Process bootstrap and exit codes.
pub mod bootstrap;
/// GUI refresh of secondary hosts.
pub mod broadcast;
/// Command-line arguments.
pub mod cli;
/// Companion file waiting.
pub mod companion;
/// Bootstrap errors.
pub mod error;
/// Library operations on the executor host.
pub mod executor;
/// Metadata capture and reapply.
pub mod metadata;
/// Notification texts and delivery.
pub mod notify;
/// Event processing pipeline.
pub mod orchestrator;
/// Event failures and outcome reporting.
pub mod outcome;
/// Source-to-host path translation.
pub mod path_map;
/// Event to action mapping.
pub mod plan;
/// Playback interruption and resume.
pub mod playback;
/// Bounded polling with backoff.
pub mod polling;
/// Host pool and probing.
pub mod registry;

pub use bootstrap::{run, run_with};
pub use error::{AppError, AppResult};
pub use orchestrator::Orchestrator;
pub use outcome::{EventOutcome, OutcomeStatus, RelayError, SoftFailure};
