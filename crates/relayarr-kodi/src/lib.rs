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

//! Kodi JSON-RPC adapter implementing [`relayarr_player_core::MediaHost`].
//!
//! Layout: `client.rs` (HTTP transport and trait implementation), `wire.rs` (request and
//! response payloads), `error.rs` (construction failures).

pub mod client;
pub mod error;
pub mod wire;

pub use client::{KodiClient, KodiTimeouts};
pub use error::{KodiError, KodiResult};
