use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition for {object_type} from {from} on {event}")]
    InvalidTransition {
        object_type: String,
        from: String,
        event: String,
    },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
