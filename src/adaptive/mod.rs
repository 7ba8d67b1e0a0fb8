pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod monitoring;
pub mod persistence;
pub mod session;
pub mod types;

pub use config::{EngineConfig, Hyperparameters};
pub use decision::{EpsilonGreedy, QLearning, ValueStore};
pub use engine::{AdaptationEngine, AdaptationSink, RewardSignal, SharedEngine};
pub use error::{AdaptiveError, Result};
pub use fusion::{fuse, fuse_labels};
pub use monitoring::SessionStats;
pub use persistence::{load_snapshot, save_snapshot, SnapshotEntry, ValueSnapshot};
pub use session::{spawn_session, Adaptation, SessionHandle, SessionManager, SessionSummary, SessionTask};
pub use types::*;
