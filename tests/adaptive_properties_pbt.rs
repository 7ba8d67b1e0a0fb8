//! Property-based tests for the adaptive engine.
//!
//! Invariants covered:
//! - Fusion priority: frustration > confusion > positive > negative > neutral
//! - Greedy selection equals the store's best action
//! - Self-transition updates rise monotonically below r / (1 - γ)
//! - Snapshot round-trip reproduces every (state, action) value

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use emotion_adaptive_engine::adaptive::{
    fuse, Action, EmotionState, EpsilonGreedy, FacialEmotion, Hyperparameters, QLearning,
    Transition, ValueSnapshot, ValueStore, VoiceSentiment,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_facial() -> impl Strategy<Value = Option<FacialEmotion>> {
    proptest::option::of(prop_oneof![
        Just(FacialEmotion::Angry),
        Just(FacialEmotion::Disgust),
        Just(FacialEmotion::Fear),
        Just(FacialEmotion::Happy),
        Just(FacialEmotion::Sad),
        Just(FacialEmotion::Surprise),
        Just(FacialEmotion::Neutral),
        Just(FacialEmotion::Confused),
        Just(FacialEmotion::Frustrated),
    ])
}

fn arb_voice() -> impl Strategy<Value = Option<VoiceSentiment>> {
    proptest::option::of(prop_oneof![
        Just(VoiceSentiment::Neutral),
        Just(VoiceSentiment::Positive),
        Just(VoiceSentiment::Negative),
        Just(VoiceSentiment::Frustrated),
        Just(VoiceSentiment::Confused),
    ])
}

fn arb_state() -> impl Strategy<Value = EmotionState> {
    (0..EmotionState::COUNT).prop_map(|i| EmotionState::ALL[i])
}

fn arb_store() -> impl Strategy<Value = ValueStore> {
    prop::collection::vec(-100.0f64..100.0, EmotionState::COUNT * Action::COUNT).prop_map(
        |values| {
            let mut store = ValueStore::initialized();
            let keys = EmotionState::ALL
                .into_iter()
                .flat_map(|s| Action::ALL.into_iter().map(move |a| (s, a)));
            for ((state, action), value) in keys.zip(values) {
                store.set(state, action, value).unwrap();
            }
            store
        },
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn fusion_follows_priority_order(facial in arb_facial(), voice in arb_voice()) {
        let state = fuse(facial, voice);
        let frustrated = facial == Some(FacialEmotion::Frustrated)
            || voice == Some(VoiceSentiment::Frustrated);
        let confused = facial == Some(FacialEmotion::Confused)
            || voice == Some(VoiceSentiment::Confused);
        let positive = facial == Some(FacialEmotion::Happy)
            || voice == Some(VoiceSentiment::Positive);
        let negative = facial == Some(FacialEmotion::Sad)
            || voice == Some(VoiceSentiment::Negative);

        let expected = if frustrated {
            EmotionState::Frustrated
        } else if confused {
            EmotionState::Confused
        } else if positive {
            EmotionState::Positive
        } else if negative {
            EmotionState::Negative
        } else {
            EmotionState::Neutral
        };
        prop_assert_eq!(state, expected);
    }

    #[test]
    fn absent_modality_never_masks_the_other(voice in arb_voice()) {
        prop_assert_eq!(fuse(None, voice), fuse(Some(FacialEmotion::Neutral), voice));
    }

    #[test]
    fn greedy_selection_is_best_action(store in arb_store(), state in arb_state(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selection = EpsilonGreedy::new()
            .select_action(&store, state, 0.0, &mut rng)
            .unwrap();
        let (best, best_value) = store.best_action(state).unwrap();
        prop_assert_eq!(selection.action, best);
        prop_assert!(!selection.explored);
        for action in Action::ALL {
            prop_assert!(store.get(state, action).unwrap() <= best_value);
        }
    }

    #[test]
    fn self_transition_rises_toward_fixed_point(reward in 0.5f64..50.0, steps in 1usize..300) {
        let rule = QLearning::new(&Hyperparameters::new(0.1, 0.9, 0.0).unwrap());
        let mut store = ValueStore::initialized();
        let transition = Transition {
            state: EmotionState::Positive,
            action: Action::ContinueCurrent,
            next_state: EmotionState::Positive,
            reward,
        };
        let bound = reward / (1.0 - 0.9);
        let mut previous = 0.0;
        for _ in 0..steps {
            let value = rule.update(&mut store, &transition).unwrap();
            prop_assert!(value > previous);
            prop_assert!(value <= bound * (1.0 + 1e-12));
            previous = value;
        }
    }

    #[test]
    fn snapshot_round_trip_is_exact(store in arb_store()) {
        let json = ValueSnapshot::from_store(&store).to_json().unwrap();
        let restored = ValueSnapshot::from_json(&json).unwrap().to_store().unwrap();
        for state in EmotionState::ALL {
            for action in Action::ALL {
                prop_assert_eq!(
                    restored.get(state, action).unwrap(),
                    store.get(state, action).unwrap()
                );
            }
        }
    }

    #[test]
    fn snapshot_missing_any_key_is_rejected(store in arb_store(), drop_index in 0usize..25) {
        let mut entries = ValueSnapshot::from_store(&store).entries().to_vec();
        entries.remove(drop_index);
        let mut target = ValueStore::initialized();
        prop_assert!(ValueSnapshot::from_entries(entries).restore_into(&mut target).is_err());
        prop_assert_eq!(target, ValueStore::initialized());
    }
}
