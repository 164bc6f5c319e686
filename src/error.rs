use thiserror::Error;

/// Errors raised by the practice engine and its stores.
#[derive(Debug, Error)]
pub enum Error {
    /// No level configuration exists for the requested id.
    #[error("Level {0} not found")]
    LevelNotFound(u32),

    /// A level configuration violates its invariants.
    #[error("Invalid level configuration: {0}")]
    InvalidConfig(String),

    /// XP awards must be strictly positive.
    #[error("Invalid XP amount {0}: XP must be a positive integer")]
    InvalidXp(i64),

    /// Fewer than four distinct answers can be produced for a config.
    #[error("Cannot build {required} distinct options for '{correct}': only {available} candidates available")]
    DegenerateOptionPool {
        correct: String,
        available: usize,
        required: usize,
    },

    #[error("Unknown interval: {0}")]
    UnknownInterval(String),

    #[error("Unknown note: {0}")]
    UnknownNote(String),

    /// The round state machine was driven out of order.
    #[error("Invalid round transition: cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
