use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error};

use crate::adaptive::config::{EngineConfig, Hyperparameters};
use crate::adaptive::decision::{EpsilonGreedy, QLearning, ValueStore};
use crate::adaptive::error::{AdaptiveError, Result};
use crate::adaptive::fusion::{fuse, parse_label};
use crate::adaptive::monitoring::SessionStats;
use crate::adaptive::persistence::ValueSnapshot;
use crate::adaptive::types::*;

pub trait AdaptationSink: Send {
    fn publish(&mut self, state: EmotionState, action: Action);
}

impl<F> AdaptationSink for F
where
    F: FnMut(EmotionState, Action) + Send,
{
    fn publish(&mut self, state: EmotionState, action: Action) {
        self(state, action)
    }
}

/// Feedback for `previous --action--> next`; `None` falls back to 0.0.
pub trait RewardSignal: Send {
    fn reward(&mut self, previous: EmotionState, action: Action, next: EmotionState)
        -> Option<f64>;
}

impl<F> RewardSignal for F
where
    F: FnMut(EmotionState, Action, EmotionState) -> Option<f64> + Send,
{
    fn reward(
        &mut self,
        previous: EmotionState,
        action: Action,
        next: EmotionState,
    ) -> Option<f64> {
        self(previous, action, next)
    }
}

pub struct AdaptationEngine<R = ChaCha8Rng> {
    store: ValueStore,
    params: Hyperparameters,
    policy: EpsilonGreedy,
    learner: QLearning,
    rng: R,
    voice_confidence_threshold: f64,
    prev_state: EmotionState,
    prev_action: Option<Action>,
    current: Option<Action>,
    halted: Option<EmotionState>,
    stats: SessionStats,
    consumer: Option<Box<dyn AdaptationSink>>,
    reward_signal: Option<Box<dyn RewardSignal>>,
}

impl AdaptationEngine<ChaCha8Rng> {
    pub fn new(config: &EngineConfig, store: ValueStore) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Self::with_rng(config, store, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> AdaptationEngine<R> {
    pub fn with_rng(config: &EngineConfig, store: ValueStore, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            params: config.hyperparameters,
            policy: EpsilonGreedy::new(),
            learner: QLearning::new(&config.hyperparameters),
            rng,
            voice_confidence_threshold: config.voice_confidence_threshold,
            prev_state: EmotionState::Neutral,
            prev_action: None,
            current: None,
            halted: None,
            stats: SessionStats::default(),
            consumer: None,
            reward_signal: None,
        })
    }

    pub fn with_consumer(mut self, consumer: impl AdaptationSink + 'static) -> Self {
        self.consumer = Some(Box::new(consumer));
        self
    }

    pub fn with_reward_signal(mut self, signal: impl RewardSignal + 'static) -> Self {
        self.reward_signal = Some(Box::new(signal));
        self
    }

    pub(crate) fn set_consumer(&mut self, consumer: Box<dyn AdaptationSink>) {
        self.consumer = Some(consumer);
    }

    pub(crate) fn set_reward_signal(&mut self, signal: Option<Box<dyn RewardSignal>>) {
        self.reward_signal = signal;
    }

    /// Runs one orchestration cycle for a raw observation.
    ///
    /// `reward` is feedback for the previous transition. A fatal error
    /// halts the engine; every later call fails with `SessionHalted`.
    pub fn observe(&mut self, observation: &Observation, reward: Option<f64>) -> Result<CycleOutcome> {
        self.ensure_running()?;
        let facial = match parse_label::<FacialEmotion>(observation.facial.as_deref()) {
            Ok(label) => label,
            Err(_) => {
                self.stats.record_unrecognized_label();
                None
            }
        };
        let voice = match parse_label::<VoiceSentiment>(observation.voice.as_deref()) {
            Ok(label) => label.map(|sentiment| VoiceReading {
                sentiment,
                confidence: observation.voice_confidence.unwrap_or(1.0),
            }),
            Err(_) => {
                self.stats.record_unrecognized_label();
                None
            }
        };
        self.cycle(facial, voice, reward)
    }

    pub fn cycle(
        &mut self,
        facial: Option<FacialEmotion>,
        voice: Option<VoiceReading>,
        reward: Option<f64>,
    ) -> Result<CycleOutcome> {
        self.ensure_running()?;
        let voice = voice
            .filter(|reading| reading.confidence >= self.voice_confidence_threshold)
            .map(|reading| reading.sentiment);
        let new_state = fuse(facial, voice);

        self.run_cycle(new_state, reward).map_err(|err| {
            if err.is_fatal() {
                error!(error = %err, state = ?new_state, "halting adaptation engine");
                self.halted = Some(new_state);
            }
            err
        })
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    fn ensure_running(&self) -> Result<()> {
        match self.halted {
            Some(state) => Err(AdaptiveError::SessionHalted { state }),
            None => Ok(()),
        }
    }

    fn run_cycle(&mut self, new_state: EmotionState, reward: Option<f64>) -> Result<CycleOutcome> {
        let selection = self.policy.select_action(
            &self.store,
            new_state,
            self.params.exploration_rate(),
            &mut self.rng,
        )?;
        let action = selection.action;

        if let Some(consumer) = self.consumer.as_mut() {
            consumer.publish(new_state, action);
        }
        self.current = Some(action);

        let update = match self.prev_action {
            Some(prev_action) => Some(self.learn(prev_action, new_state, reward)?),
            None => {
                if reward.is_some() {
                    debug!(state = ?new_state, "no previous action, reward discarded");
                    self.stats.record_discarded_reward();
                }
                None
            }
        };

        self.prev_state = new_state;
        self.prev_action = Some(action);

        let outcome = CycleOutcome {
            state: new_state,
            action,
            explored: selection.explored,
            update,
        };
        self.stats.record_cycle(&outcome);
        debug!(
            state = ?new_state,
            action = ?action,
            explored = selection.explored,
            "adaptation cycle complete"
        );
        Ok(outcome)
    }

    fn learn(
        &mut self,
        prev_action: Action,
        next_state: EmotionState,
        reward: Option<f64>,
    ) -> Result<UpdateOutcome> {
        let prev_state = self.prev_state;
        let reward = reward
            .or_else(|| {
                self.reward_signal
                    .as_mut()
                    .and_then(|signal| signal.reward(prev_state, prev_action, next_state))
            })
            .unwrap_or(0.0);
        let transition = Transition {
            state: prev_state,
            action: prev_action,
            next_state,
            reward,
        };
        let old_value = self.store.get(prev_state, prev_action).ok();

        match self.learner.update(&mut self.store, &transition) {
            Ok(new_value) => Ok(UpdateOutcome::Applied {
                old_value: old_value.unwrap_or(0.0),
                new_value,
                reward,
            }),
            Err(AdaptiveError::NumericOverflow { value, .. }) => {
                debug!(
                    state = ?prev_state,
                    action = ?prev_action,
                    value,
                    "value update skipped, prior value retained"
                );
                Ok(UpdateOutcome::Rejected {
                    retained_value: old_value.unwrap_or(0.0),
                    reward,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn into_store(self) -> ValueStore {
        self.store
    }

    pub fn snapshot(&self) -> ValueSnapshot {
        ValueSnapshot::from_store(&self.store)
    }

    pub fn current_adaptation(&self) -> Option<Action> {
        self.current
    }

    pub fn previous_state(&self) -> EmotionState {
        self.prev_state
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.params
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

/// An engine behind one per-session lock, for callers that must drive a
/// session from several execution contexts.
pub struct SharedEngine<R = ChaCha8Rng> {
    inner: Arc<Mutex<AdaptationEngine<R>>>,
}

impl<R> Clone for SharedEngine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Rng> SharedEngine<R> {
    pub fn new(engine: AdaptationEngine<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn observe(&self, observation: &Observation, reward: Option<f64>) -> Result<CycleOutcome> {
        self.inner.lock().observe(observation, reward)
    }

    pub fn snapshot(&self) -> ValueSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn current_adaptation(&self) -> Option<Action> {
        self.inner.lock().current_adaptation()
    }

    pub fn is_halted(&self) -> bool {
        self.inner.lock().is_halted()
    }

    pub fn stats(&self) -> SessionStats {
        self.inner.lock().stats().clone()
    }
}
