use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber: `RUST_LOG` filter (default `info`), UTC RFC 3339
/// timestamps on stderr, and a close event per span so each invocation's duration
/// is logged.
///
/// With `json` set, lines are emitted as structured JSON for log shippers.
/// Calling this twice is harmless; the second call only logs a warning.
pub fn init(service_name: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let span_events = fmt::format::FmtSpan::CLOSE;

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(span_events)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_span_events(span_events)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!(service = service_name, json, "tracing initialized"),
        Err(err) => tracing::warn!(service = service_name, error = %err, "tracing already initialized"),
    }
}
