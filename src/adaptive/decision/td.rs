use tracing::warn;

use crate::adaptive::config::Hyperparameters;
use crate::adaptive::decision::value_store::ValueStore;
use crate::adaptive::error::{AdaptiveError, Result};
use crate::adaptive::types::Transition;

#[derive(Debug, Clone, Copy)]
pub struct QLearning {
    learning_rate: f64,
    discount_factor: f64,
}

impl QLearning {
    pub fn new(params: &Hyperparameters) -> Self {
        Self {
            learning_rate: params.learning_rate(),
            discount_factor: params.discount_factor(),
        }
    }

    /// `Q(s,a) += α · (r + γ · max_a' Q(s',a') − Q(s,a))`. On error the store
    /// is left untouched.
    pub fn update(&self, store: &mut ValueStore, transition: &Transition) -> Result<f64> {
        let Transition {
            state,
            action,
            next_state,
            reward,
        } = *transition;

        if !store.contains_state(next_state) {
            return Err(AdaptiveError::UninitializedState { state: next_state });
        }
        let old_q = store
            .get(state, action)
            .map_err(|_| AdaptiveError::UninitializedState { state })?;
        let max_next_q = store.max_value(next_state)?;

        let new_q = old_q
            + self.learning_rate * (reward + self.discount_factor * max_next_q - old_q);

        if !new_q.is_finite() {
            warn!(
                state = ?state,
                action = ?action,
                reward,
                old_q,
                "rejected non-finite value update"
            );
            return Err(AdaptiveError::NumericOverflow {
                state,
                action,
                value: new_q,
            });
        }

        store.set(state, action, new_q)?;
        Ok(new_q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::{Action, EmotionState};

    fn learner() -> QLearning {
        QLearning::new(&Hyperparameters::new(0.1, 0.9, 0.1).unwrap())
    }

    #[test]
    fn test_single_update_matches_formula() {
        let mut store = ValueStore::initialized();
        store.set(EmotionState::Positive, Action::ContinueCurrent, 2.0).unwrap();
        store.set(EmotionState::Neutral, Action::TakeBreak, 1.0).unwrap();

        let value = learner()
            .update(
                &mut store,
                &Transition {
                    state: EmotionState::Neutral,
                    action: Action::TakeBreak,
                    next_state: EmotionState::Positive,
                    reward: 0.5,
                },
            )
            .unwrap();

        // 1.0 + 0.1 * (0.5 + 0.9 * 2.0 - 1.0)
        assert!((value - 1.13).abs() < 1e-12);
        assert_eq!(store.get(EmotionState::Neutral, Action::TakeBreak).unwrap(), value);
    }

    #[test]
    fn test_zero_reward_on_fresh_store_keeps_zero() {
        let mut store = ValueStore::initialized();
        let value = learner()
            .update(
                &mut store,
                &Transition {
                    state: EmotionState::Neutral,
                    action: Action::SimplifyContent,
                    next_state: EmotionState::Confused,
                    reward: 0.0,
                },
            )
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_self_transition_converges_monotonically() {
        let mut store = ValueStore::initialized();
        let rule = learner();
        let transition = Transition {
            state: EmotionState::Positive,
            action: Action::InteractiveExercise,
            next_state: EmotionState::Positive,
            reward: 10.0,
        };
        let bound = 10.0 / (1.0 - 0.9);
        let mut previous = 0.0;

        for _ in 0..2_000 {
            let value = rule.update(&mut store, &transition).unwrap();
            assert!(value > previous);
            assert!(value <= bound + 1e-9);
            previous = value;
        }
        assert!((bound - previous).abs() < 1.0);
    }

    #[test]
    fn test_missing_next_state_is_uninitialized_and_leaves_store() {
        let mut store = ValueStore::new();
        store.initialize(
            &[EmotionState::Neutral, EmotionState::Positive],
            &Action::ALL,
        );
        store.set(EmotionState::Neutral, Action::TakeBreak, 3.0).unwrap();
        let before = store.clone();

        let err = learner()
            .update(
                &mut store,
                &Transition {
                    state: EmotionState::Neutral,
                    action: Action::TakeBreak,
                    next_state: EmotionState::Frustrated,
                    reward: 1.0,
                },
            )
            .unwrap_err();

        assert!(matches!(
            err,
            AdaptiveError::UninitializedState { state: EmotionState::Frustrated }
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_missing_current_state_is_uninitialized() {
        let mut store = ValueStore::new();
        store.initialize(&[EmotionState::Positive], &Action::ALL);
        let err = learner()
            .update(
                &mut store,
                &Transition {
                    state: EmotionState::Negative,
                    action: Action::TakeBreak,
                    next_state: EmotionState::Positive,
                    reward: 1.0,
                },
            )
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_non_finite_update_is_rejected() {
        let mut store = ValueStore::initialized();
        store.set(EmotionState::Neutral, Action::TakeBreak, 1.5).unwrap();

        let err = learner()
            .update(
                &mut store,
                &Transition {
                    state: EmotionState::Neutral,
                    action: Action::TakeBreak,
                    next_state: EmotionState::Neutral,
                    reward: f64::INFINITY,
                },
            )
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::NumericOverflow { .. }));
        assert_eq!(store.get(EmotionState::Neutral, Action::TakeBreak).unwrap(), 1.5);

        store.set(EmotionState::Negative, Action::SimplifyContent, f64::MAX).unwrap();
        let err = learner()
            .update(
                &mut store,
                &Transition {
                    state: EmotionState::Negative,
                    action: Action::SimplifyContent,
                    next_state: EmotionState::Negative,
                    reward: f64::MAX,
                },
            )
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            store.get(EmotionState::Negative, Action::SimplifyContent).unwrap(),
            f64::MAX
        );
    }
}
