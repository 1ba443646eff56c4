pub mod bridge;
pub mod config;
pub mod device;
pub mod session;
pub mod video;

use nexus_core::{Bridge, Config, Event};

/// Best-effort delivery of engine events to the bridge, when it is on.
/// Failures are logged and never fail the command.
pub(crate) fn forward_events(config: &Config, events: &[Event]) {
    if events.is_empty() || !config.bridge.enabled {
        return;
    }
    let bridge = match Bridge::from_config(&config.bridge) {
        Ok(bridge) => bridge,
        Err(e) => {
            tracing::warn!(error = %e, "bridge unavailable, dropping events");
            return;
        }
    };
    for event in events {
        match bridge.forward(event) {
            Ok(status) => tracing::debug!(event = event.name(), status, "event forwarded"),
            Err(e) => tracing::warn!(event = event.name(), error = %e, "bridge post failed"),
        }
    }
}
