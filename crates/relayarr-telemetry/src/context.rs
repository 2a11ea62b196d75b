//! Span helpers for event processing.
//!
//! # Design
//! - Every relayed event runs inside one `event` span so all lines carry the run id.
//! - The build version is attached from the value recorded at initialisation.

use tracing::Span;

use crate::init::build_version;

/// Span wrapping the processing of one event.
#[must_use]
pub fn event_span(event_kind: &str, run_id: &str) -> Span {
    tracing::info_span!(
        "event",
        run_id = %run_id,
        event_kind = %event_kind,
        version = %build_version(),
        executor = tracing::field::Empty,
    )
}

/// Record the selected executor host on the current event span.
pub fn record_executor(host: &str) {
    Span::current().record("executor", tracing::field::display(host));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_span_can_be_entered_without_subscriber() {
        let span = event_span("download_new", "run-1");
        let _entered = span.enter();
        record_executor("Living Room");
    }
}
