mod movie;
mod question;
mod record;
mod stats;

pub use movie::Movie;
pub use question::{Comparison, Question, RATING_THRESHOLDS};
pub use record::{GameRecord, GameRecordError};
pub use stats::AggregateStats;
