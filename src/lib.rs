//! Operator console engine for a fleet-monitoring backend
//!
//! Polls the selected host, turns backend responses into display projections and runs remote
//! actions and advisory recommendations through an explicit state machine.

pub mod api;
pub mod codec;
pub mod config;
pub mod console;
pub mod error;
pub mod execution;
pub mod projection;
pub mod scheduler;
pub mod session;
pub mod util;

pub use api::{ConsoleApi, HttpApiClient};
pub use config::ConsoleConfig;
pub use console::{ConsoleHandle, ConsoleState, TriggerOutcome};
pub use error::{ConsoleError, ConsoleResult};
pub use session::View;
