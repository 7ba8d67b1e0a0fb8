use thiserror::Error;

use crate::adaptive::types::{Action, EmotionState, Modality};

#[derive(Debug, Error)]
pub enum AdaptiveError {
    #[error("state {state} is not present in the value store")]
    UninitializedState { state: EmotionState },

    #[error("no value for ({state}, {action}); value store was never initialized")]
    KeyNotFound { state: EmotionState, action: Action },

    #[error("invalid hyperparameter {name}: {value}")]
    InvalidHyperparameter { name: &'static str, value: f64 },

    #[error("update of ({state}, {action}) produced non-finite value {value}")]
    NumericOverflow {
        state: EmotionState,
        action: Action,
        value: f64,
    },

    #[error("unrecognized {modality} label: {label:?}")]
    UnrecognizedLabel { modality: Modality, label: String },

    #[error("snapshot is missing {missing} entries")]
    IncompleteSnapshot { missing: usize },

    #[error("snapshot contains ({state}, {action}) more than once")]
    DuplicateSnapshotEntry { state: EmotionState, action: Action },

    #[error("snapshot value for ({state}, {action}) is not finite")]
    NonFiniteSnapshotValue { state: EmotionState, action: Action },

    #[error("session halted after a fatal error in state {state}")]
    SessionHalted { state: EmotionState },

    #[error("session is closed")]
    SessionClosed,

    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AdaptiveError {
    /// Invariant violations that must halt the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UninitializedState { .. } | Self::SessionHalted { .. }
        )
    }

    /// Per-cycle errors that are handled locally without interrupting adaptation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NumericOverflow { .. } | Self::UnrecognizedLabel { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AdaptiveError>;
