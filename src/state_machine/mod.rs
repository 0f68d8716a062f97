// Per-object-type lifecycle for migration runs.
//
// Each object type in a manifest moves Pending -> Querying -> Transforming -> Submitting
// -> Patching -> Done, or ends in Failed / Cancelled.

pub mod errors;
pub mod events;
pub mod object_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::ObjectMigrationEvent;
pub use object_state_machine::{ObjectStateMachine, StateTransition};
pub use states::ObjectMigrationState;
