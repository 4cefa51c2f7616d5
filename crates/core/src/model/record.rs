use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameRecordError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Snapshot of one finished game: score, question count, and when it
/// was recorded.
///
/// Records are ordered by accuracy ratio; a record with `total == 0`
/// ranks below everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    correct: u32,
    total: u32,
    recorded_at: DateTime<Utc>,
}

impl GameRecord {
    #[must_use]
    pub fn new(correct: u32, total: u32, recorded_at: DateTime<Utc>) -> Self {
        Self {
            correct,
            total,
            recorded_at,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `GameRecordError::CorrectExceedsTotal` if the score is
    /// larger than the question count.
    pub fn from_persisted(
        correct: u32,
        total: u32,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, GameRecordError> {
        if correct > total {
            return Err(GameRecordError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self::new(correct, total, recorded_at))
    }

    /// The zero-valued record used when nothing has been persisted yet.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(0, 0, DateTime::UNIX_EPOCH)
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Accuracy as a percentage; `0.0` when no questions were asked.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }

    /// Whether this record strictly improves on `other`.
    ///
    /// Equal accuracy keeps the existing record, so the persisted best
    /// only ever improves or stays put.
    #[must_use]
    pub fn beats(&self, other: &GameRecord) -> bool {
        self.accuracy() > other.accuracy()
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::empty()
    }
}
