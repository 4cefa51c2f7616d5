use serde::{Deserialize, Serialize};

/// Lifetime play statistics derived from the persisted running sums.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub games_count: u32,
    pub correct_sum: f64,
    pub total_sum: u64,
}

impl AggregateStats {
    /// Average answer accuracy across all recorded games, in percent.
    ///
    /// `0.0` before the first game is recorded; never divides by zero.
    #[must_use]
    pub fn average_accuracy(&self) -> f64 {
        if self.total_sum == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = self.total_sum as f64;
        self.correct_sum / total * 100.0
    }
}
