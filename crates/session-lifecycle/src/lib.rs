//! Session and authentication lifecycle for the Opsdesk client.
//!
//! Ties the auth API client and the token store together behind a single
//! state machine: startup validation, login/logout, expiry locking, the
//! inactivity timeout, and the heartbeat all end up as inputs to one
//! transition table owned by [`SessionManager`].

mod activity;
mod error;
mod fsm;
mod manager;
mod scheduler;

#[cfg(test)]
mod tests;

pub use activity::ActivityTracker;
pub use error::{LifecycleError, LifecycleResult};
pub use fsm::session_machine;
pub use fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use manager::{SessionCallback, SessionChangedPayload, SessionManager, SessionSnapshot};
pub use scheduler::GatedTask;
