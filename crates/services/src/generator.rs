use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quiz_core::model::{Comparison, Movie, Question, RATING_THRESHOLDS};

use crate::error::GeneratorError;
use crate::fetch::ImageFetcher;

/// Builds one randomized question per call from a movie snapshot.
///
/// Movie, threshold, and comparison direction are drawn uniformly; the
/// correct answer is computed once from the frozen rating. The RNG is
/// injected so tests can seed it.
pub struct QuestionGenerator {
    images: Arc<dyn ImageFetcher>,
    rng: Mutex<StdRng>,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(images: Arc<dyn ImageFetcher>) -> Self {
        Self::with_rng(images, StdRng::from_os_rng())
    }

    /// Deterministic generator for tests.
    #[must_use]
    pub fn with_seed(images: Arc<dyn ImageFetcher>, seed: u64) -> Self {
        Self::with_rng(images, StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(images: Arc<dyn ImageFetcher>, rng: StdRng) -> Self {
        Self {
            images,
            rng: Mutex::new(rng),
        }
    }

    /// Draw the next question from a non-empty movie snapshot.
    ///
    /// A failed poster fetch is non-fatal: the question proceeds with
    /// empty image bytes.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Empty` when `movies` is empty; never
    /// fails otherwise.
    pub async fn next(&self, movies: &[Movie]) -> Result<Question, GeneratorError> {
        if movies.is_empty() {
            return Err(GeneratorError::Empty);
        }

        // All draws happen under the lock; the image fetch awaits after
        // it is released.
        let (movie, threshold, direction) = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let movie = movies[rng.random_range(0..movies.len())].clone();
            let threshold = RATING_THRESHOLDS[rng.random_range(0..RATING_THRESHOLDS.len())];
            let direction = if rng.random::<bool>() {
                Comparison::Greater
            } else {
                Comparison::Less
            };
            (movie, threshold, direction)
        };

        let image = match self.images.fetch_bytes(&movie.resized_image_url()).await {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("poster fetch failed for {:?}: {err}", movie.title());
                Vec::new()
            }
        };

        Ok(Question::from_draw(
            image,
            movie.rating_value(),
            threshold,
            direction,
        ))
    }
}
