//! Console engine
//!
//! The console runs as a single actor task. Presentation code talks to it through a
//! [`ConsoleHandle`] and draws from the published [`ConsoleState`].
//!
//! ## Guarantees
//!
//! - Only the selected host is ever polled; selecting another host cancels the previous timer
//!   before the first fetch for the new one.
//! - A response that arrives after its host was deselected never touches the state.
//! - An action can only run once at a time per host; a second trigger while it runs is ignored.

pub mod actor;
pub mod messages;
pub mod state;

pub use actor::{ConsoleActor, ConsoleHandle};
pub use messages::{ConsoleCommand, ConsoleEvent, TriggerOutcome};
pub use state::{AdviceView, CANCELLED, ChatAnswer, ChatEntry, ConsoleState, Panel};
