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

//! Shared test helpers used across the relay test suites.
//! Layout: fixtures.rs (config, event and episode builders), mocks.rs (scriptable in-memory
//! media host).

pub mod fixtures;
pub mod mocks;
