//! Outbound device plumbing: the lock actuator and the automation bridge.
//!
//! Both talk plain HTTP through `reqwest`. Each owns a small current-thread
//! runtime so callers (the engine, the CLI) stay synchronous.

pub mod bridge;
pub mod esp32;
pub mod traits;

pub use bridge::{Bridge, BridgePayload};
pub use esp32::HttpActuator;
pub use traits::Actuator;

fn blocking_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
