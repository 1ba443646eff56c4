//! # Nexus Core Library
//!
//! Core logic for the Nexus timed-restriction controller. Every operation is
//! reachable from the standalone `nexus` CLI; any other front end (a web page
//! poller, a desktop shell) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Session engine**: a wall-clock state machine. The caller polls
//!   `evaluate()`; phases are re-derived from elapsed time on every call and
//!   one-shot side effects (lock, video start, pulse delivery) latch.
//! - **Threshold generator / punishment policy**: pure functions over a
//!   caller-supplied random source.
//! - **Device**: the HTTP lock actuator and the automation bridge.
//! - **Storage**: SQLite session snapshot and TOML configuration.
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: the phase engine
//! - [`Actuator`]: lock/unlock capability the engine drives
//! - [`Database`]: session snapshot persistence
//! - [`Config`]: configuration management

pub mod device;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod video;

pub use device::{Actuator, Bridge, HttpActuator};
pub use error::{ActuatorError, BridgeError, ConfigError, CoreError, SessionError, StorageError};
pub use events::Event;
pub use session::{
    AbortOutcome, Phase, PunishmentAction, Session, SessionEngine, SessionStatus, StartRequest,
    ThresholdSet, ViolationKind, ViolationOutcome,
};
pub use storage::{Config, Database};
pub use video::VideoPool;
