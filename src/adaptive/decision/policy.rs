use rand::Rng;
use tracing::trace;

use crate::adaptive::decision::value_store::ValueStore;
use crate::adaptive::error::Result;
use crate::adaptive::types::{Action, EmotionState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSelection {
    pub action: Action,
    pub explored: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EpsilonGreedy;

impl EpsilonGreedy {
    pub fn new() -> Self {
        Self
    }

    pub fn select_action<R: Rng + ?Sized>(
        &self,
        store: &ValueStore,
        state: EmotionState,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<ActionSelection> {
        let draw: f64 = rng.random();

        if draw < epsilon {
            let action = Action::ALL[rng.random_range(0..Action::COUNT)];
            trace!(state = ?state, action = ?action, draw, "exploring");
            return Ok(ActionSelection {
                action,
                explored: true,
            });
        }

        let (action, value) = store.best_action(state)?;
        trace!(state = ?state, action = ?action, value, "exploiting");
        Ok(ActionSelection {
            action,
            explored: false,
        })
    }
}
