//! A long-lived subprocess manager that exchanges textual UCI commands
//! with an external engine binary while presenting a typed asynchronous
//! message interface to callers.
//!
//! This crate owns the state machine, the bidirectional message queues,
//! the event primitives and round-robin waiter underneath them, and the
//! subprocess plumbing the I/O loop runs over. It performs no search or
//! evaluation itself — every external UCI engine it drives does that.

pub mod error;

pub mod event;
pub mod sync;

pub mod subprocess;

pub mod message;
pub mod options;
pub mod queue;
pub mod state;

pub mod codec;
pub mod driver;

#[cfg(feature = "config")]
pub mod config;

pub use driver::{DebugHook, LineDirection, UciDriver};
pub use error::{DriverError, Result};
pub use event::{Event, EventKind, WaitOutcome, Waiter};
pub use message::{EngineMessage, GoParams, GuiMessage, PositionRoot, Registration, SearchInfo};
pub use options::{OptionKind, UciOptionDescriptor};
pub use queue::MessageQueue;
pub use state::DriverState;
pub use subprocess::Subprocess;

#[cfg(feature = "config")]
pub use config::EngineConfig;
