//! Opt-in `tracing` setup for hosts embedding `timeline-sync`.
//!
//! Events are emitted under the module paths below, so a host can tune the
//! remote, change-feed and gesture streams independently through `RUST_LOG`.

/// Page fetches, retries and commits.
pub const REMOTE_TARGET: &str = "timeline_sync::remote";
/// Suppression decisions, debounced refetches and store transitions.
pub const SYNC_TARGET: &str = "timeline_sync::sync";
/// Drag sessions and gesture commits.
pub const GESTURE_TARGET: &str = "timeline_sync::interaction";

/// Filter used when `RUST_LOG` is unset.
///
/// The change feed is the noisiest stream at `debug`; `sync_debug` opts into it.
#[must_use]
pub fn default_filter(sync_debug: bool) -> String {
    let sync_level = if sync_debug { "debug" } else { "info" };
    format!("warn,timeline_sync=info,{REMOTE_TARGET}=info,{SYNC_TARGET}={sync_level},{GESTURE_TARGET}=info")
}

/// Installs a compact fmt subscriber with [`default_filter`] unless `RUST_LOG` is set.
///
/// Returns `false` when the `telemetry` feature is off or a global subscriber
/// is already installed.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(&default_filter(false))
}

/// Like [`init_default_tracing`] with an explicit fallback filter.
#[must_use]
pub fn init_tracing(fallback_filter: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_filter;
        false
    }
}
