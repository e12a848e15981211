//! Per-connection role state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Role of one transport connection.
///
/// Valid transitions:
/// - Unbound -> Instructor (created a thread)
/// - Unbound -> Student (joined a thread)
/// - Instructor -> Terminated (closed its thread)
/// - Student -> Terminated (its thread was closed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Unbound,
    Instructor,
    Student,
    Terminated,
}

impl ConnectionState {
    /// Returns true if the connection is bound to a thread and may post notes.
    pub fn is_bound(&self) -> bool {
        matches!(self, ConnectionState::Instructor | ConnectionState::Student)
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Unbound => vec![Instructor, Student],
            Instructor | Student => vec![Terminated],
            Terminated => vec![],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Unbound => "UNBOUND",
            ConnectionState::Instructor => "INSTRUCTOR",
            ConnectionState::Student => "STUDENT",
            ConnectionState::Terminated => "TERMINATED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbound() {
        assert_eq!(ConnectionState::default(), ConnectionState::Unbound);
    }

    #[test]
    fn unbound_can_become_either_role() {
        assert!(ConnectionState::Unbound.can_transition_to(&ConnectionState::Instructor));
        assert!(ConnectionState::Unbound.can_transition_to(&ConnectionState::Student));
        assert!(!ConnectionState::Unbound.can_transition_to(&ConnectionState::Terminated));
    }

    #[test]
    fn roles_cannot_switch() {
        assert!(ConnectionState::Student
            .transition_to(ConnectionState::Instructor)
            .is_err());
        assert!(ConnectionState::Instructor
            .transition_to(ConnectionState::Student)
            .is_err());
    }

    #[test]
    fn terminated_is_terminal() {
        assert!(ConnectionState::Terminated.is_terminal());
        assert!(!ConnectionState::Student.is_terminal());
        assert_eq!(
            ConnectionState::Instructor.transition_to(ConnectionState::Terminated),
            Ok(ConnectionState::Terminated)
        );
    }

    #[test]
    fn only_roles_are_bound() {
        assert!(ConnectionState::Instructor.is_bound());
        assert!(ConnectionState::Student.is_bound());
        assert!(!ConnectionState::Unbound.is_bound());
        assert!(!ConnectionState::Terminated.is_bound());
    }

    #[test]
    fn display_uses_upper_case_names() {
        assert_eq!(ConnectionState::Student.to_string(), "STUDENT");
    }
}
