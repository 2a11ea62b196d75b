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

//! Binary entrypoint: relays one Sonarr event and exits with the mapped code.

use std::process;

/// Runs the relay and forwards its exit code.
#[tokio::main]
async fn main() {
    let exit_code = relayarr_app::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
