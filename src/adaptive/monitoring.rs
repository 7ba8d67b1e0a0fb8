use serde::{Deserialize, Serialize};

use crate::adaptive::types::{Action, CycleOutcome, UpdateOutcome};

/// Per-session counters kept by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub cycles: u64,
    pub explorations: u64,
    pub exploitations: u64,
    pub updates_applied: u64,
    pub updates_rejected: u64,
    pub unrecognized_labels: u64,
    /// Rewards that arrived before any action had been taken.
    pub discarded_rewards: u64,
    /// Times each action was chosen, indexed in `Action::ALL` order.
    pub action_counts: [u64; Action::COUNT],
}

impl SessionStats {
    pub fn record_cycle(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        if outcome.explored {
            self.explorations += 1;
        } else {
            self.exploitations += 1;
        }
        if let Some(index) = Action::ALL.iter().position(|&a| a == outcome.action) {
            self.action_counts[index] += 1;
        }
        match outcome.update {
            Some(UpdateOutcome::Applied { .. }) => self.updates_applied += 1,
            Some(UpdateOutcome::Rejected { .. }) => self.updates_rejected += 1,
            None => {}
        }
    }

    pub fn record_unrecognized_label(&mut self) {
        self.unrecognized_labels += 1;
    }

    pub fn record_discarded_reward(&mut self) {
        self.discarded_rewards += 1;
    }

    pub fn exploration_ratio(&self) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        self.explorations as f64 / self.cycles as f64
    }

    pub fn count_for(&self, action: Action) -> u64 {
        Action::ALL
            .iter()
            .position(|&a| a == action)
            .map(|i| self.action_counts[i])
            .unwrap_or(0)
    }
}
