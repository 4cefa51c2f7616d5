use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use quiz_core::Clock;
use quiz_core::model::{AggregateStats, GameRecord};
use storage::repository::KeyValueStore;

const GAMES_COUNT_KEY: &str = "games_count";
const BEST_GAME_KEY: &str = "best_game";
const CORRECT_SUM_KEY: &str = "correct_answers";
const TOTAL_SUM_KEY: &str = "total_answers";

/// Persists aggregate play statistics and the best game record.
///
/// All mutation goes through [`record`](Self::record), which runs under
/// one critical section so no reader observes the games count bumped
/// without the matching sums. Persistence failures never abort a
/// session: reads fall back to zero-valued defaults, writes are logged
/// and dropped.
#[derive(Clone)]
pub struct StatisticsService {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    record_lock: Arc<Mutex<()>>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            kv,
            record_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(clock, storage::repository::Storage::in_memory().kv)
    }

    /// Fold one finished game into the persisted statistics.
    ///
    /// Bumps the games count, adds to the running answer sums, and
    /// replaces the best record only when this game strictly improves
    /// on it (accuracy-ratio ordering).
    pub async fn record(&self, correct: u32, total: u32) {
        let _guard = self.record_lock.lock().await;

        let games = self.read_or(GAMES_COUNT_KEY, 0_u32).await.saturating_add(1);
        let correct_sum = self.read_or(CORRECT_SUM_KEY, 0.0_f64).await + f64::from(correct);
        let total_sum = self
            .read_or(TOTAL_SUM_KEY, 0_u64)
            .await
            .saturating_add(u64::from(total));

        self.write_best_effort(GAMES_COUNT_KEY, &games).await;
        self.write_best_effort(CORRECT_SUM_KEY, &correct_sum).await;
        self.write_best_effort(TOTAL_SUM_KEY, &total_sum).await;

        let candidate = GameRecord::new(correct, total, self.clock.now());
        if candidate.beats(&self.read_best().await) {
            self.write_best_effort(BEST_GAME_KEY, &candidate).await;
        }
    }

    /// Number of games recorded so far.
    pub async fn games_count(&self) -> u32 {
        let _guard = self.record_lock.lock().await;
        self.read_or(GAMES_COUNT_KEY, 0_u32).await
    }

    /// Best game on record; the zero-valued default when none exists or
    /// the persisted value is corrupt.
    pub async fn best_game(&self) -> GameRecord {
        let _guard = self.record_lock.lock().await;
        self.read_best().await
    }

    /// Average answer accuracy across all games, in percent.
    pub async fn average_accuracy(&self) -> f64 {
        self.aggregate().await.average_accuracy()
    }

    /// One consistent view over the persisted counters.
    pub async fn aggregate(&self) -> AggregateStats {
        let _guard = self.record_lock.lock().await;
        AggregateStats {
            games_count: self.read_or(GAMES_COUNT_KEY, 0_u32).await,
            correct_sum: self.read_or(CORRECT_SUM_KEY, 0.0_f64).await,
            total_sum: self.read_or(TOTAL_SUM_KEY, 0_u64).await,
        }
    }

    async fn read_best(&self) -> GameRecord {
        let record: GameRecord = self.read_or(BEST_GAME_KEY, GameRecord::empty()).await;
        // A decoded record can still be nonsense (score above total);
        // treat it like any other corrupt value.
        GameRecord::from_persisted(record.correct(), record.total(), record.recorded_at())
            .unwrap_or_else(|_| GameRecord::empty())
    }

    async fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.kv.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("corrupt statistics value under {key}: {err}");
                    default
                }
            },
            Ok(None) => default,
            Err(err) => {
                log::warn!("statistics read failed for {key}: {err}");
                default
            }
        }
    }

    async fn write_best_effort<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                if let Err(err) = self.kv.set(key, &bytes).await {
                    log::warn!("statistics write failed for {key}: {err}");
                }
            }
            Err(err) => log::warn!("statistics encode failed for {key}: {err}"),
        }
    }
}
