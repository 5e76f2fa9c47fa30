//! Error types for the combat core.

use thiserror::Error;

use crate::ids::ActorId;

/// Top-level error type for corebreak operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// State machine errors
    #[error("State machine error: {0}")]
    Fsm(#[from] FsmError),

    /// Simulation/handle errors
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// State machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    /// A transition targeted a state the machine never declared
    #[error("undeclared state {state} in {machine} machine")]
    UndeclaredState {
        /// Machine label (e.g. "player", "boss")
        machine: &'static str,
        /// Debug name of the requested state
        state: String,
    },
}

/// Errors raised when the host drives the simulation with bad handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Handle does not resolve to a live actor
    #[error("actor not found: {0}")]
    UnknownActor(ActorId),

    /// Handle resolves to an actor of a different kind
    #[error("actor {id} is a {actual}, expected {expected}")]
    WrongKind {
        /// Offending handle
        id: ActorId,
        /// Kind the operation requires
        expected: &'static str,
        /// Kind the actor actually has
        actual: &'static str,
    },

    /// The operation needs an actor kind the simulation does not contain
    #[error("no {0} in the simulation")]
    MissingActor(&'static str),

    /// A second player was spawned into the same simulation
    #[error("a player already exists: {0}")]
    PlayerAlreadySpawned(ActorId),
}

/// Result type alias for corebreak operations.
pub type CoreResult<T> = Result<T, CoreError>;
