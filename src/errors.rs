//! Error types for the Parlay wagering engine
//!
//! Every game-logic error is local to the round that raised it and leaves
//! the balance invariant intact.

use crate::money::Amount;

/// Root error type for all engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Round configuration rejected before any ledger interaction
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Stake reservation failed; the round aborts with no balance change
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Amount,
        available: Amount,
    },

    /// Ledger detected an out-of-order settlement attempt
    #[error("concurrent mutation conflict: settle seq {expected} expected, got {actual}")]
    ConcurrentMutationConflict { expected: u64, actual: u64 },

    /// A committed round sat resolving past its deadline and was force-aborted
    #[error("dangling round {round_id} force-aborted, stake refunded")]
    DanglingRound { round_id: String },

    /// An operation was applied in the wrong round phase
    #[error(transparent)]
    RoundState(#[from] RoundStateError),
}

/// Phase violations on a round state machine
#[derive(Debug, thiserror::Error)]
pub enum RoundStateError {
    #[error("round {round_id} is {actual}, operation requires {expected}")]
    WrongPhase {
        round_id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("round {round_id} already reached a terminal state")]
    AlreadyTerminal { round_id: String },

    #[error("unknown or inactive round {round_id}")]
    UnknownRound { round_id: String },

    #[error("another round is still active; settle or abort it first")]
    AnotherRoundActive,
}

/// Convenience alias for engine results
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Whether the caller can recover by re-prompting or retrying later
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::DanglingRound { .. })
    }
}
