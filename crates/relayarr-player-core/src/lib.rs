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

//! Player-agnostic library and playback interfaces shared by the relay and its adapters.

pub mod error;
pub mod model;
pub mod service;

pub use error::{HostError, HostResult};
pub use model::{
    ActivePlayer, EpisodeDetails, EpisodeId, ItemMetadata, Notification, PathStyle, Platform,
    PlaybackPosition, PlayerId, PlayerItem, ResumePoint, ShowDetails, ShowId,
};
pub use service::MediaHost;
