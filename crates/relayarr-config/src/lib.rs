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

//! File-backed relay configuration.
//!
//! Layout: `model.rs` (typed settings document), `loader.rs` (read + parse + validate),
//! `validate.rs` (field checks), `defaults.rs` (serde defaults and the shipped template).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use model::{
    HostConfig, LibraryConfig, LogConfig, LogFormat, LogLevel, NotificationSettings,
    PathMapping, RelayConfig, TimeoutConfig,
};
