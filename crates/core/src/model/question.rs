use serde::{Deserialize, Serialize};

/// The fixed ladder of rating thresholds questions are built from.
pub const RATING_THRESHOLDS: [f64; 9] = [5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0];

/// Direction of the rating comparison a question asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Greater,
    Less,
}

impl Comparison {
    /// Evaluates the comparison for a rating against a threshold.
    ///
    /// Strict in both directions: a rating exactly on the threshold is
    /// `false` whichever way the question asks.
    #[must_use]
    pub fn evaluate(self, rating: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => rating > threshold,
            Comparison::Less => rating < threshold,
        }
    }

    /// Renders the yes/no prompt for this comparison and threshold.
    #[must_use]
    pub fn prompt(self, threshold: f64) -> String {
        match self {
            Comparison::Greater => {
                format!("Is this movie's rating greater than {threshold:.1}?")
            }
            Comparison::Less => format!("Is this movie's rating less than {threshold:.1}?"),
        }
    }
}

/// A single yes/no quiz question.
///
/// The correct answer is frozen at construction from the movie's rating,
/// the drawn threshold, and the drawn direction; it never changes after
/// that, even if the catalog reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub image: Vec<u8>,
    pub text: String,
    pub correct_answer: bool,
}

impl Question {
    /// Builds a question from a frozen rating value and the drawn
    /// threshold/direction pair.
    #[must_use]
    pub fn from_draw(
        image: Vec<u8>,
        rating: f64,
        threshold: f64,
        direction: Comparison,
    ) -> Self {
        Self {
            image,
            text: direction.prompt(threshold),
            correct_answer: direction.evaluate(rating, threshold),
        }
    }
}
