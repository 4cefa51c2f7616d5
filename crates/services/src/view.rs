//! Presenter-facing payloads. The engine formats these once; the
//! external presenter treats the strings as opaque.

use quiz_core::model::{AggregateStats, GameRecord, Question};

const ROUND_OVER_TITLE: &str = "This round is over!";
const PLAY_AGAIN_LABEL: &str = "Play again";

/// One question as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub image: Vec<u8>,
    pub prompt: String,
    /// 1-based position in the session, e.g. `"3/10"`.
    pub counter: String,
}

impl QuestionView {
    #[must_use]
    pub fn new(question: &Question, number: usize, total: usize) -> Self {
        Self {
            image: question.image.clone(),
            prompt: question.text.clone(),
            counter: format!("{number}/{total}"),
        }
    }
}

/// End-of-session summary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub title: String,
    pub message: String,
    pub button_text: String,
}

impl ResultsView {
    /// Builds the four-line results summary: this game's score, the
    /// lifetime game count, the best record with its date, and the
    /// average accuracy.
    #[must_use]
    pub fn build(correct: u32, total: usize, stats: &AggregateStats, best: &GameRecord) -> Self {
        let best_date = best.recorded_at().format("%d.%m.%y %H:%M");
        let message = format!(
            "Your result: {correct}/{total}\n\
             Quizzes played: {}\n\
             Record: {}/{} ({best_date})\n\
             Average accuracy: {:.2}%",
            stats.games_count,
            best.correct(),
            best.total(),
            stats.average_accuracy(),
        );
        Self {
            title: ROUND_OVER_TITLE.to_owned(),
            message,
            button_text: PLAY_AGAIN_LABEL.to_owned(),
        }
    }
}
