//! Asynchronous per-session runtime.
//!
//! Each session is one tokio task that owns its `AdaptationEngine`. Facial
//! and voice readings arrive on a single ordered queue, are latched, and
//! expire after the configured TTL. Every modality reading triggers exactly
//! one orchestration cycle, so value-store writes are strictly serialized
//! without any locking.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adaptive::config::EngineConfig;
use crate::adaptive::decision::ValueStore;
use crate::adaptive::engine::{AdaptationEngine, RewardSignal};
use crate::adaptive::error::{AdaptiveError, Result};
use crate::adaptive::monitoring::SessionStats;
use crate::adaptive::persistence::ValueSnapshot;
use crate::adaptive::types::{Action, EmotionState, Observation};

/// The latest intervention published by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptation {
    pub cycle: u64,
    pub state: EmotionState,
    pub action: Action,
}

#[derive(Debug)]
pub enum SessionEvent {
    Facial(Option<String>),
    Voice {
        label: Option<String>,
        confidence: Option<f64>,
    },
    /// Feedback for the transition that the next cycle completes.
    Reward(f64),
    Snapshot(oneshot::Sender<ValueSnapshot>),
    Stats(oneshot::Sender<SessionStats>),
    End,
}

/// Final state of a session that ended normally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub snapshot: ValueSnapshot,
    pub stats: SessionStats,
}

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    events: mpsc::Sender<SessionEvent>,
    adaptation: watch::Receiver<Option<Adaptation>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn facial(&self, label: Option<&str>) -> Result<()> {
        self.send(SessionEvent::Facial(label.map(str::to_string)))
            .await
    }

    pub async fn voice(&self, label: Option<&str>, confidence: Option<f64>) -> Result<()> {
        self.send(SessionEvent::Voice {
            label: label.map(str::to_string),
            confidence,
        })
        .await
    }

    pub async fn reward(&self, value: f64) -> Result<()> {
        self.send(SessionEvent::Reward(value)).await
    }

    /// Snapshot taken after every event queued before this call.
    pub async fn snapshot(&self) -> Result<ValueSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionEvent::Snapshot(tx)).await?;
        rx.await.map_err(|_| AdaptiveError::SessionClosed)
    }

    pub async fn stats(&self) -> Result<SessionStats> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionEvent::Stats(tx)).await?;
        rx.await.map_err(|_| AdaptiveError::SessionClosed)
    }

    pub fn current_adaptation(&self) -> Option<Action> {
        self.latest().map(|a| a.action)
    }

    pub fn latest(&self) -> Option<Adaptation> {
        *self.adaptation.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Adaptation>> {
        self.adaptation.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    async fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AdaptiveError::SessionClosed)
    }
}

/// Owner side of a running session.
#[derive(Debug)]
pub struct SessionTask {
    handle: SessionHandle,
    task: JoinHandle<Result<SessionSummary>>,
}

impl SessionTask {
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Stops feeding the session and waits for its final summary.
    ///
    /// A session halted by a fatal error returns that error here.
    pub async fn end(self) -> Result<SessionSummary> {
        let _ = self.handle.events.send(SessionEvent::End).await;
        self.task.await.map_err(|err| {
            error!(session_id = %self.handle.id, error = %err, "session task failed");
            AdaptiveError::SessionClosed
        })?
    }
}

/// Starts a session task; must be called inside a tokio runtime.
pub fn spawn_session(
    config: &EngineConfig,
    store: ValueStore,
    reward_signal: Option<Box<dyn RewardSignal>>,
) -> Result<SessionTask> {
    let id = Uuid::new_v4();
    let mut engine = AdaptationEngine::new(config, store)?;
    engine.set_reward_signal(reward_signal);

    let (adaptation_tx, adaptation_rx) = watch::channel(None);
    let mut cycle = 0u64;
    engine.set_consumer(Box::new(move |state: EmotionState, action: Action| {
        cycle += 1;
        adaptation_tx.send_replace(Some(Adaptation {
            cycle,
            state,
            action,
        }));
    }));

    let (events_tx, events_rx) = mpsc::channel(config.queue_capacity);
    let ttl = Duration::from_millis(config.observation_ttl_ms);
    let task = tokio::spawn(run_session(id, engine, events_rx, ttl));

    info!(session_id = %id, "adaptive session started");
    Ok(SessionTask {
        handle: SessionHandle {
            id,
            events: events_tx,
            adaptation: adaptation_rx,
        },
        task,
    })
}

struct Latched {
    label: Option<String>,
    confidence: Option<f64>,
    at: Instant,
}

impl Latched {
    fn fresh(&self, now: Instant, ttl: Duration) -> Option<&Latched> {
        (now.duration_since(self.at) <= ttl).then_some(self)
    }
}

async fn run_session(
    id: Uuid,
    mut engine: AdaptationEngine,
    mut events: mpsc::Receiver<SessionEvent>,
    ttl: Duration,
) -> Result<SessionSummary> {
    let mut facial: Option<Latched> = None;
    let mut voice: Option<Latched> = None;
    let mut pending_reward: Option<f64> = None;

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Facial(label) => {
                facial = Some(Latched {
                    label,
                    confidence: None,
                    at: Instant::now(),
                });
            }
            SessionEvent::Voice { label, confidence } => {
                voice = Some(Latched {
                    label,
                    confidence,
                    at: Instant::now(),
                });
            }
            SessionEvent::Reward(value) => {
                if pending_reward.replace(value).is_some() {
                    warn!(session_id = %id, "reward replaced before it was applied");
                }
                continue;
            }
            SessionEvent::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
                continue;
            }
            SessionEvent::Stats(reply) => {
                let _ = reply.send(engine.stats().clone());
                continue;
            }
            SessionEvent::End => break,
        }

        let now = Instant::now();
        let facial_now = facial.as_ref().and_then(|f| f.fresh(now, ttl));
        let voice_now = voice.as_ref().and_then(|v| v.fresh(now, ttl));
        let observation = Observation {
            facial: facial_now.and_then(|f| f.label.clone()),
            voice: voice_now.and_then(|v| v.label.clone()),
            voice_confidence: voice_now.and_then(|v| v.confidence),
        };

        if let Err(err) = engine.observe(&observation, pending_reward.take()) {
            error!(session_id = %id, error = %err, "adaptive session halted");
            return Err(err);
        }
    }

    let stats = engine.stats().clone();
    info!(session_id = %id, cycles = stats.cycles, "adaptive session ended");
    Ok(SessionSummary {
        snapshot: engine.snapshot(),
        stats,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Registry of independent learner sessions.
pub struct SessionManager {
    config: EngineConfig,
    sessions: RwLock<HashMap<Uuid, (SessionTask, DateTime<Utc>)>>,
}

impl SessionManager {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Starts a session with a fresh store, or one restored from `snapshot`.
    pub fn start(
        &self,
        snapshot: Option<&ValueSnapshot>,
        reward_signal: Option<Box<dyn RewardSignal>>,
    ) -> Result<SessionHandle> {
        let store = match snapshot {
            Some(snapshot) => snapshot.to_store()?,
            None => ValueStore::initialized(),
        };
        let task = spawn_session(&self.config, store, reward_signal)?;
        let handle = task.handle().clone();
        self.sessions
            .write()
            .insert(handle.id(), (task, Utc::now()));
        Ok(handle)
    }

    pub fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.prune_closed();
        self.sessions
            .read()
            .get(&id)
            .map(|(task, _)| task.handle().clone())
    }

    pub fn list(&self) -> Vec<SessionInfo> {
        self.prune_closed();
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .iter()
            .map(|(&id, (_, started_at))| SessionInfo {
                id,
                started_at: *started_at,
            })
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    pub fn len(&self) -> usize {
        self.prune_closed();
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions whose task has already stopped after a fatal error.
    fn prune_closed(&self) {
        self.sessions.write().retain(|id, (task, _)| {
            let closed = task.handle().is_closed();
            if closed {
                warn!(session_id = %id, "removing halted session");
            }
            !closed
        });
    }

    /// Ends a session and returns its final snapshot and counters.
    pub async fn end(&self, id: Uuid) -> Result<SessionSummary> {
        let entry = self.sessions.write().remove(&id);
        let (task, _) = entry.ok_or(AdaptiveError::SessionNotFound(id))?;
        task.end().await
    }
}
