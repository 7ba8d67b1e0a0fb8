use std::collections::HashMap;

use crate::adaptive::error::{AdaptiveError, Result};
use crate::adaptive::types::{Action, EmotionState};

/// Session-scoped table of action values keyed by `(state, action)`.
///
/// Created once per learner session. After `initialize` every requested
/// `(state, action)` pair holds a finite value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStore {
    values: HashMap<(EmotionState, Action), f64>,
}

impl ValueStore {
    /// An empty store; every read fails until `initialize` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store populated with every state and action at 0.0.
    pub fn initialized() -> Self {
        let mut store = Self::new();
        store.initialize(&EmotionState::ALL, &Action::ALL);
        store
    }

    /// Sets every `(state, action)` pair to 0.0.
    ///
    /// Call once at session start. Calling it again discards everything
    /// learned so far.
    pub fn initialize(&mut self, states: &[EmotionState], actions: &[Action]) {
        self.values.clear();
        for &state in states {
            for &action in actions {
                self.values.insert((state, action), 0.0);
            }
        }
    }

    pub fn get(&self, state: EmotionState, action: Action) -> Result<f64> {
        self.values
            .get(&(state, action))
            .copied()
            .ok_or(AdaptiveError::KeyNotFound { state, action })
    }

    /// Writes one value. Non-finite values are refused and the cell keeps
    /// its previous contents.
    pub fn set(&mut self, state: EmotionState, action: Action, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(AdaptiveError::NumericOverflow {
                state,
                action,
                value,
            });
        }
        self.values.insert((state, action), value);
        Ok(())
    }

    pub fn contains_state(&self, state: EmotionState) -> bool {
        Action::ALL
            .iter()
            .any(|&action| self.values.contains_key(&(state, action)))
    }

    /// Highest-valued action for `state`.
    ///
    /// Actions are scanned in declaration order and only a strictly greater
    /// value replaces the current best, so the first declared action wins ties.
    pub fn best_action(&self, state: EmotionState) -> Result<(Action, f64)> {
        let mut best: Option<(Action, f64)> = None;
        for action in Action::ALL {
            let Some(&value) = self.values.get(&(state, action)) else {
                continue;
            };
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((action, value)),
            }
        }
        best.ok_or(AdaptiveError::UninitializedState { state })
    }

    /// Maximum value over all actions of `state`.
    pub fn max_value(&self, state: EmotionState) -> Result<f64> {
        self.best_action(state).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in canonical `(state, action)` order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionState, Action, f64)> + '_ {
        EmotionState::ALL.into_iter().flat_map(move |state| {
            Action::ALL.into_iter().filter_map(move |action| {
                self.values
                    .get(&(state, action))
                    .map(|&value| (state, action, value))
            })
        })
    }

    /// Replaces the whole table at once.
    pub(crate) fn replace_all(&mut self, values: HashMap<(EmotionState, Action), f64>) {
        self.values = values;
    }
}
