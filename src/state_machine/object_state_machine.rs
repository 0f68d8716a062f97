use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    errors::{StateMachineError, StateMachineResult},
    events::ObjectMigrationEvent,
    states::ObjectMigrationState,
};

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: ObjectMigrationState,
    pub to: ObjectMigrationState,
    pub event: String,
    pub at: DateTime<Utc>,
}

/// State machine for one object type's migration, with an in-memory transition log
#[derive(Debug, Clone)]
pub struct ObjectStateMachine {
    object_type: String,
    state: ObjectMigrationState,
    history: Vec<StateTransition>,
}

impl ObjectStateMachine {
    pub fn new(object_type: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            state: ObjectMigrationState::default(),
            history: Vec::new(),
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn current_state(&self) -> ObjectMigrationState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Attempt to transition the object state
    pub fn transition(
        &mut self,
        event: ObjectMigrationEvent,
    ) -> StateMachineResult<ObjectMigrationState> {
        let target = self.determine_target_state(&event)?;

        debug!(
            object_type = %self.object_type,
            from = %self.state,
            to = %target,
            event = event.event_type(),
            "Object state transition"
        );

        self.history.push(StateTransition {
            from: self.state,
            to: target,
            event: event.event_type().to_string(),
            at: Utc::now(),
        });
        self.state = target;

        Ok(target)
    }

    /// Determine the target state based on current state and event
    fn determine_target_state(
        &self,
        event: &ObjectMigrationEvent,
    ) -> StateMachineResult<ObjectMigrationState> {
        use ObjectMigrationEvent as E;
        use ObjectMigrationState as S;

        let target = match (self.state, event) {
            (S::Pending, E::StartQuery) => S::Querying,
            (S::Querying, E::RecordsFetched(_)) => S::Transforming,
            (S::Transforming, E::Submit) => S::Submitting,
            (S::Submitting, E::SubmissionsComplete) => S::Patching,
            (S::Patching, E::Complete) => S::Done,

            // Cancellation is honoured only before remote writes start
            (S::Pending | S::Querying, E::Cancel) => S::Cancelled,

            (from, E::Fail(_)) if !from.is_terminal() => S::Failed,

            (from, _) => {
                return Err(StateMachineError::InvalidTransition {
                    object_type: self.object_type.clone(),
                    from: from.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = ObjectStateMachine::new("Account");
        let events = [
            ObjectMigrationEvent::StartQuery,
            ObjectMigrationEvent::RecordsFetched(3),
            ObjectMigrationEvent::Submit,
            ObjectMigrationEvent::SubmissionsComplete,
            ObjectMigrationEvent::Complete,
        ];
        for event in events {
            machine.transition(event).unwrap();
        }

        assert_eq!(machine.current_state(), ObjectMigrationState::Done);
        assert!(machine.is_terminal());
        let visited: Vec<_> = machine.history().iter().map(|t| t.to).collect();
        assert_eq!(
            visited,
            vec![
                ObjectMigrationState::Querying,
                ObjectMigrationState::Transforming,
                ObjectMigrationState::Submitting,
                ObjectMigrationState::Patching,
                ObjectMigrationState::Done,
            ]
        );
    }

    #[test]
    fn test_failure_from_active_state() {
        let mut machine = ObjectStateMachine::new("Account");
        machine.transition(ObjectMigrationEvent::StartQuery).unwrap();
        let state = machine
            .transition(ObjectMigrationEvent::fail_with_error("query failed"))
            .unwrap();
        assert_eq!(state, ObjectMigrationState::Failed);
    }

    #[test]
    fn test_terminal_states_reject_events() {
        let mut machine = ObjectStateMachine::new("Account");
        machine.transition(ObjectMigrationEvent::Cancel).unwrap();

        let err = machine
            .transition(ObjectMigrationEvent::fail_with_error("late"))
            .unwrap_err();
        assert!(matches!(err, StateMachineError::InvalidTransition { .. }));
        assert_eq!(machine.current_state(), ObjectMigrationState::Cancelled);
    }

    #[test]
    fn test_cannot_cancel_while_submitting() {
        let mut machine = ObjectStateMachine::new("Account");
        machine.transition(ObjectMigrationEvent::StartQuery).unwrap();
        machine.transition(ObjectMigrationEvent::RecordsFetched(0)).unwrap();
        machine.transition(ObjectMigrationEvent::Submit).unwrap();

        assert!(machine.transition(ObjectMigrationEvent::Cancel).is_err());
        assert_eq!(machine.current_state(), ObjectMigrationState::Submitting);
    }

    #[test]
    fn test_out_of_order_event_is_rejected() {
        let mut machine = ObjectStateMachine::new("Contact");
        let err = machine
            .transition(ObjectMigrationEvent::Submit)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition for Contact from pending on submit"
        );
    }
}
