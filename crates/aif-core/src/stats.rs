//! Running engine statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Action;

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    /// Number of completed state-inference calls.
    pub inference_count: u64,
    /// Mean surprise over all inference calls (0 before the first).
    pub average_surprise: f64,
    /// Surprise of the most recent inference call.
    pub last_surprise: Option<f64>,
    /// How often each action has been selected.
    pub action_counts: BTreeMap<Action, u64>,
    /// Number of supervised A-matrix updates applied.
    pub learning_updates: u64,
}

/// Accumulator behind [`EngineStats`].
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsTracker {
    inference_count: u64,
    total_surprise: f64,
    last_surprise: Option<f64>,
    action_counts: [u64; Action::COUNT],
    learning_updates: u64,
}

impl StatsTracker {
    pub(crate) fn record_inference(&mut self, surprise: f64) {
        self.inference_count += 1;
        self.total_surprise += surprise;
        self.last_surprise = Some(surprise);
    }

    pub(crate) fn record_action(&mut self, action: Action) {
        self.action_counts[action.index()] += 1;
    }

    pub(crate) fn record_learning(&mut self) {
        self.learning_updates += 1;
    }

    pub(crate) fn snapshot(&self) -> EngineStats {
        let average_surprise = if self.inference_count == 0 {
            0.0
        } else {
            self.total_surprise / self.inference_count as f64
        };
        EngineStats {
            inference_count: self.inference_count,
            average_surprise,
            last_surprise: self.last_surprise,
            action_counts: Action::ALL
                .iter()
                .map(|&a| (a, self.action_counts[a.index()]))
                .collect(),
            learning_updates: self.learning_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = StatsTracker::default().snapshot();
        assert_eq!(stats.inference_count, 0);
        assert_eq!(stats.average_surprise, 0.0);
        assert_eq!(stats.last_surprise, None);
        assert_eq!(stats.action_counts.len(), Action::COUNT);
        assert!(stats.action_counts.values().all(|&n| n == 0));
    }

    #[test]
    fn test_running_average() {
        let mut tracker = StatsTracker::default();
        tracker.record_inference(1.0);
        tracker.record_inference(3.0);
        tracker.record_action(Action::Reflect);
        tracker.record_action(Action::Reflect);
        let stats = tracker.snapshot();
        assert_eq!(stats.inference_count, 2);
        assert_eq!(stats.average_surprise, 2.0);
        assert_eq!(stats.last_surprise, Some(3.0));
        assert_eq!(stats.action_counts[&Action::Reflect], 2);
    }

    #[test]
    fn test_serializes_action_names() {
        let mut tracker = StatsTracker::default();
        tracker.record_action(Action::Explore);
        let json = serde_json::to_value(tracker.snapshot()).unwrap();
        assert_eq!(json["action_counts"]["explore"], 1);
    }
}
