//! Session state machine.
//!
//! All session transitions flow through this table. Anything that wants to
//! change the session state submits an input; inputs that are not valid for
//! the current state are rejected, which is what makes duplicate failure
//! events and races between timers harmless.
//!
//! ```text
//!   Initializing    --SessionValidated-->   Authenticated
//!   Initializing    --NoSession------->     Unauthenticated
//!   Unauthenticated --SessionValidated-->   Authenticated
//!   any             --LoginSucceeded--->    Authenticated
//!   Authenticated   --LockTriggered---->    Locked
//!   Locked          --LoginSucceeded--->    Authenticated   (unlock)
//!   any             --SessionTerminated->   Unauthenticated
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Initializing)

    Initializing => {
        SessionValidated => Authenticated,
        NoSession => Unauthenticated,
        LoginSucceeded => Authenticated,
        SessionTerminated => Unauthenticated
    },
    Unauthenticated => {
        SessionValidated => Authenticated,
        NoSession => Unauthenticated,
        LoginSucceeded => Authenticated,
        SessionTerminated => Unauthenticated
    },
    Authenticated => {
        LoginSucceeded => Authenticated,
        LockTriggered => Locked,
        SessionTerminated => Unauthenticated
    },
    Locked => {
        LoginSucceeded => Authenticated,
        SessionTerminated => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Serializable view of the machine state for snapshots and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Unauthenticated,
    Authenticated,
    Locked,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, SessionState::Locked)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Initializing => SessionState::Initializing,
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::Locked => SessionState::Locked,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Initializing => "initializing",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated => "authenticated",
            SessionState::Locked => "locked",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_initializing() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Initializing);
    }

    #[test]
    fn test_startup_validation_succeeds() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::SessionValidated)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_startup_with_no_session() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::NoSession).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_login_from_unauthenticated() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::NoSession).unwrap();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_login_straight_from_initializing() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_revalidation_from_unauthenticated() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::NoSession).unwrap();
        machine
            .consume(&SessionMachineInput::SessionValidated)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_lock_from_authenticated() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        machine.consume(&SessionMachineInput::LockTriggered).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Locked);
    }

    #[test]
    fn test_unlock_via_login() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        machine.consume(&SessionMachineInput::LockTriggered).unwrap();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_termination_from_every_state() {
        for setup in [
            vec![],
            vec![SessionMachineInput::NoSession],
            vec![SessionMachineInput::LoginSucceeded],
            vec![
                SessionMachineInput::LoginSucceeded,
                SessionMachineInput::LockTriggered,
            ],
        ] {
            let mut machine = SessionMachine::new();
            for input in &setup {
                machine.consume(input).unwrap();
            }
            machine
                .consume(&SessionMachineInput::SessionTerminated)
                .unwrap();
            assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
        }
    }

    #[test]
    fn test_termination_is_idempotent() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::SessionTerminated)
            .unwrap();
        machine
            .consume(&SessionMachineInput::SessionTerminated)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_lock_rejected_when_not_authenticated() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionMachineInput::LockTriggered).is_err());

        machine.consume(&SessionMachineInput::NoSession).unwrap();
        assert!(machine.consume(&SessionMachineInput::LockTriggered).is_err());
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_lock_rejected_when_already_locked() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        machine.consume(&SessionMachineInput::LockTriggered).unwrap();
        assert!(machine.consume(&SessionMachineInput::LockTriggered).is_err());
        assert_eq!(*machine.state(), SessionMachineState::Locked);
    }

    #[test]
    fn test_validation_rejected_once_authenticated() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        assert!(machine
            .consume(&SessionMachineInput::SessionValidated)
            .is_err());
        assert!(machine.consume(&SessionMachineInput::NoSession).is_err());
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_relogin_while_authenticated() {
        let mut machine = SessionMachine::new();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        machine
            .consume(&SessionMachineInput::LoginSucceeded)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_state_view_conversion() {
        assert_eq!(
            SessionState::from(&SessionMachineState::Initializing),
            SessionState::Initializing
        );
        assert_eq!(
            SessionState::from(&SessionMachineState::Locked),
            SessionState::Locked
        );
        assert!(SessionState::from(&SessionMachineState::Authenticated).is_authenticated());
        assert!(!SessionState::from(&SessionMachineState::Unauthenticated).is_authenticated());
    }

    #[test]
    fn test_state_view_serializes_snake_case() {
        let json = serde_json::to_string(&SessionState::Unauthenticated).unwrap();
        assert_eq!(json, "\"unauthenticated\"");
        assert_eq!(SessionState::Locked.to_string(), "locked");
    }
}
