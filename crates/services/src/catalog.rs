use std::sync::{Arc, RwLock};

use quiz_core::model::Movie;

use crate::error::LoadError;
use crate::fetch::MovieFetcher;

/// Owns the list of candidate movies for question generation.
///
/// `load` replaces the list under a write lock (single writer per
/// load/reset cycle) while `snapshot` readers proceed concurrently.
pub struct MovieCatalog {
    fetcher: Arc<dyn MovieFetcher>,
    movies: RwLock<Vec<Movie>>,
}

impl MovieCatalog {
    #[must_use]
    pub fn new(fetcher: Arc<dyn MovieFetcher>) -> Self {
        Self {
            fetcher,
            movies: RwLock::new(Vec::new()),
        }
    }

    /// Fetch the dataset and replace the stored list.
    ///
    /// Returns the number of movies loaded. The catalog never retries
    /// internally; retry policy belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on transport or decode failures; the stored
    /// list is left untouched in that case.
    pub async fn load(&self) -> Result<usize, LoadError> {
        let fetched = self.fetcher.fetch_movies().await?;
        let count = fetched.len();
        *self.write_lock() = fetched;
        Ok(count)
    }

    /// The currently loaded movies; empty before the first successful
    /// load and after a reset.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Movie> {
        self.read_lock().clone()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.read_lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    /// Clears the stored list until the next successful `load`.
    pub fn reset(&self) {
        self.write_lock().clear();
    }

    // A poisoned lock only means another caller panicked mid-access;
    // the list itself is still a valid value, so ride through it.
    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Vec<Movie>> {
        match self.movies.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Movie>> {
        match self.movies.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
