//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime owns the transcript and executes the effects returned here.

mod effect;
pub mod event;
pub mod history;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{SessionContext, SessionState, SessionStatus};
pub use transition::{transition, TransitionError};
