//! Adaptive learning engine.
//!
//! Fuses facial and voice emotion labels into a learner state, picks a
//! pedagogical intervention with an epsilon-greedy policy over a per-session
//! Q-table, and refines that table with one-step Q-learning as feedback
//! arrives.

pub mod adaptive;
pub mod config;
pub mod logging;

pub use adaptive::{
    AdaptationEngine, AdaptiveError, Action, EmotionState, EngineConfig, Hyperparameters,
    SessionManager, ValueSnapshot, ValueStore,
};
