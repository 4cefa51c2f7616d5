use tokio::sync::Mutex;

use quiz_core::model::Question;

use crate::catalog::MovieCatalog;
use crate::error::{GeneratorError, SessionError};
use crate::generator::QuestionGenerator;
use crate::statistics::StatisticsService;
use crate::view::{QuestionView, ResultsView};

/// Where a session currently stands.
///
/// `Loading` covers both the initial dataset load and the gap while the
/// next question's poster is being fetched; answers submitted in that
/// gap are ignored, which is what makes question requests single-flight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Loading,
    AwaitingAnswer {
        question: Question,
        index: usize,
    },
    Finished(ResultsView),
}

/// Outcome of submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The submission arrived outside `AwaitingAnswer` and was dropped.
    Ignored,
    Next {
        was_correct: bool,
        question: QuestionView,
    },
    Finished {
        was_correct: bool,
        results: ResultsView,
    },
}

/// Progress counters for the running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: u32,
    pub is_finished: bool,
}

#[derive(Default)]
struct SessionInner {
    state: SessionState,
    correct_answers: u32,
    answered: usize,
    total_questions: usize,
    /// Bumped on every reset; an awaited fetch whose captured epoch no
    /// longer matches must not touch the session.
    epoch: u64,
}

/// Drives the session lifecycle: load, question/answer cycles, scoring,
/// and the final statistics record.
///
/// The controller owns its collaborators outright; the presenter holds
/// the controller and consumes the returned view payloads.
pub struct SessionController {
    catalog: MovieCatalog,
    generator: QuestionGenerator,
    statistics: StatisticsService,
    question_limit: Option<usize>,
    inner: Mutex<SessionInner>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        catalog: MovieCatalog,
        generator: QuestionGenerator,
        statistics: StatisticsService,
    ) -> Self {
        Self {
            catalog,
            generator,
            statistics,
            question_limit: None,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Cap the session at `limit` questions instead of playing through
    /// the whole loaded catalog.
    #[must_use]
    pub fn with_question_limit(mut self, limit: usize) -> Self {
        self.question_limit = Some(limit);
        self
    }

    /// Begin a session: load the catalog and produce the first question.
    ///
    /// On load failure the session returns to `NotStarted` so the
    /// caller can retry; internal counters stay untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` when a session is in
    /// progress, `SessionError::Load` for dataset failures, and
    /// `SessionError::Cancelled` when a reset overtook the load.
    pub async fn start(&self) -> Result<QuestionView, SessionError> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                SessionState::NotStarted | SessionState::Finished(_) => {}
                SessionState::Loading | SessionState::AwaitingAnswer { .. } => {
                    return Err(SessionError::AlreadyStarted);
                }
            }
            inner.state = SessionState::Loading;
            inner.correct_answers = 0;
            inner.answered = 0;
            inner.total_questions = 0;
            inner.epoch
        };

        let loaded = match self.catalog.load().await {
            Ok(count) => count,
            Err(err) => {
                self.recover_to_not_started(epoch).await;
                return Err(err.into());
            }
        };

        let total = self.question_limit.map_or(loaded, |cap| cap.min(loaded));
        if total == 0 {
            self.recover_to_not_started(epoch).await;
            return Err(GeneratorError::Empty.into());
        }

        let question = match self.next_question().await {
            Ok(question) => question,
            Err(err) => {
                self.recover_to_not_started(epoch).await;
                return Err(err.into());
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return Err(SessionError::Cancelled);
        }
        inner.total_questions = total;
        let view = QuestionView::new(&question, 1, total);
        inner.state = SessionState::AwaitingAnswer { question, index: 0 };
        Ok(view)
    }

    /// Score an answer and advance the session.
    ///
    /// Outside `AwaitingAnswer` this is a deliberate no-op
    /// (`AnswerOutcome::Ignored`): nothing is counted, nothing fails.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Cancelled` when a reset overtook the
    /// next-question fetch, or a generator error if the catalog was
    /// emptied mid-session.
    pub async fn submit_answer(&self, given_answer: bool) -> Result<AnswerOutcome, SessionError> {
        let (index, was_correct, correct_answers, total, epoch) = {
            let mut inner = self.inner.lock().await;
            match std::mem::take(&mut inner.state) {
                SessionState::AwaitingAnswer { question, index } => {
                    let was_correct = given_answer == question.correct_answer;
                    if was_correct {
                        inner.correct_answers += 1;
                    }
                    inner.answered = index + 1;
                    inner.state = SessionState::Loading;
                    (
                        index,
                        was_correct,
                        inner.correct_answers,
                        inner.total_questions,
                        inner.epoch,
                    )
                }
                other => {
                    inner.state = other;
                    return Ok(AnswerOutcome::Ignored);
                }
            }
        };

        if index + 1 == total {
            return self.finish(was_correct, correct_answers, total, epoch).await;
        }

        let question = match self.next_question().await {
            Ok(question) => question,
            Err(err) => {
                self.recover_to_not_started(epoch).await;
                return Err(err.into());
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return Err(SessionError::Cancelled);
        }
        let view = QuestionView::new(&question, index + 2, total);
        inner.state = SessionState::AwaitingAnswer {
            question,
            index: index + 1,
        };
        Ok(AnswerOutcome::Next {
            was_correct,
            question: view,
        })
    }

    /// Abandon the current session and return to `NotStarted`.
    ///
    /// Persisted statistics are untouched; a finished game was already
    /// recorded at finish time. Any fetch still in flight is left to
    /// complete and its result discarded.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        inner.correct_answers = 0;
        inner.answered = 0;
        inner.total_questions = 0;
        inner.state = SessionState::NotStarted;
        self.catalog.reset();
    }

    /// Snapshot of the current state, for the presenter.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn progress(&self) -> SessionProgress {
        let inner = self.inner.lock().await;
        SessionProgress {
            total: inner.total_questions,
            answered: inner.answered,
            correct: inner.correct_answers,
            is_finished: matches!(inner.state, SessionState::Finished(_)),
        }
    }

    async fn finish(
        &self,
        was_correct: bool,
        correct_answers: u32,
        total: usize,
        epoch: u64,
    ) -> Result<AnswerOutcome, SessionError> {
        let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);
        self.statistics.record(correct_answers, total_u32).await;

        let aggregate = self.statistics.aggregate().await;
        let best = self.statistics.best_game().await;
        let results = ResultsView::build(correct_answers, total, &aggregate, &best);

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return Err(SessionError::Cancelled);
        }
        inner.state = SessionState::Finished(results.clone());
        Ok(AnswerOutcome::Finished {
            was_correct,
            results,
        })
    }

    async fn next_question(&self) -> Result<Question, GeneratorError> {
        let movies = self.catalog.snapshot();
        self.generator.next(&movies).await
    }

    async fn recover_to_not_started(&self, epoch: u64) {
        let mut inner = self.inner.lock().await;
        if inner.epoch == epoch && matches!(inner.state, SessionState::Loading) {
            inner.state = SessionState::NotStarted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use url::Url;

    use quiz_core::model::Movie;
    use quiz_core::time::fixed_clock;

    use crate::error::{FetchError, LoadError};
    use crate::fetch::{ImageFetcher, MovieFetcher};

    struct StubFetcher {
        movies: Vec<Movie>,
    }

    #[async_trait]
    impl MovieFetcher for StubFetcher {
        async fn fetch_movies(&self) -> Result<Vec<Movie>, LoadError> {
            if self.movies.is_empty() {
                return Err(LoadError::Decode("empty payload".into()));
            }
            Ok(self.movies.clone())
        }
    }

    struct StubImages;

    #[async_trait]
    impl ImageFetcher for StubImages {
        async fn fetch_bytes(&self, _url: &Url) -> Result<Vec<u8>, FetchError> {
            Ok(vec![0xFF])
        }
    }

    /// Image fetcher whose fetch, once armed, parks until the test
    /// releases it. Lets a `reset()` land while a fetch is in flight.
    #[derive(Default)]
    struct GatedImages {
        armed: std::sync::atomic::AtomicBool,
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    impl GatedImages {
        fn arm(&self) {
            self.armed.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ImageFetcher for GatedImages {
        async fn fetch_bytes(&self, _url: &Url) -> Result<Vec<u8>, FetchError> {
            if self.armed.load(std::sync::atomic::Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(vec![0xFF])
        }
    }

    fn gated_controller(
        movie_count: usize,
        images: Arc<GatedImages>,
    ) -> Arc<SessionController> {
        let catalog = MovieCatalog::new(Arc::new(StubFetcher {
            movies: movies(movie_count),
        }));
        let generator = QuestionGenerator::with_seed(images, 11);
        Arc::new(SessionController::new(
            catalog,
            generator,
            StatisticsService::in_memory(fixed_clock()),
        ))
    }

    fn movies(count: usize) -> Vec<Movie> {
        (0..count)
            .map(|i| {
                Movie::new(
                    format!("Movie {i}"),
                    format!("{:.1}", 5.0 + (i % 5) as f64),
                    Url::parse("https://img.example/poster._V1_.jpg").unwrap(),
                )
            })
            .collect()
    }

    fn controller(movie_count: usize) -> SessionController {
        let catalog = MovieCatalog::new(Arc::new(StubFetcher {
            movies: movies(movie_count),
        }));
        let generator = QuestionGenerator::with_seed(Arc::new(StubImages), 11);
        SessionController::new(catalog, generator, StatisticsService::in_memory(fixed_clock()))
    }

    /// Answer correctly when `correctly` is true by peeking at the
    /// stored question.
    async fn answer(controller: &SessionController, correctly: bool) -> AnswerOutcome {
        let SessionState::AwaitingAnswer { question, .. } = controller.state().await else {
            panic!("expected AwaitingAnswer");
        };
        let given = if correctly {
            question.correct_answer
        } else {
            !question.correct_answer
        };
        controller.submit_answer(given).await.unwrap()
    }

    #[tokio::test]
    async fn start_loads_and_serves_first_question() {
        let controller = controller(10);
        let view = controller.start().await.unwrap();
        assert_eq!(view.counter, "1/10");
        assert!(!view.prompt.is_empty());
        assert!(matches!(
            controller.state().await,
            SessionState::AwaitingAnswer { index: 0, .. }
        ));
    }

    #[tokio::test]
    async fn session_length_follows_loaded_movie_count() {
        let controller = controller(3);
        let view = controller.start().await.unwrap();
        assert_eq!(view.counter, "1/3");
    }

    #[tokio::test]
    async fn question_limit_caps_the_session() {
        let catalog = MovieCatalog::new(Arc::new(StubFetcher { movies: movies(10) }));
        let generator = QuestionGenerator::with_seed(Arc::new(StubImages), 11);
        let controller =
            SessionController::new(catalog, generator, StatisticsService::in_memory(fixed_clock()))
                .with_question_limit(4);

        let view = controller.start().await.unwrap();
        assert_eq!(view.counter, "1/4");
    }

    #[tokio::test]
    async fn failed_load_returns_to_not_started_for_retry() {
        let controller = controller(0);
        assert!(matches!(
            controller.start().await.unwrap_err(),
            SessionError::Load(_)
        ));
        assert_eq!(controller.state().await, SessionState::NotStarted);
        assert_eq!(controller.progress().await.correct, 0);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let controller = controller(5);
        controller.start().await.unwrap();
        assert!(matches!(
            controller.start().await.unwrap_err(),
            SessionError::AlreadyStarted
        ));
    }

    #[tokio::test]
    async fn full_session_scores_and_records_statistics() {
        let controller = controller(10);
        controller.start().await.unwrap();

        // 6 correct answers, then 4 wrong ones
        for i in 0..10 {
            let outcome = answer(&controller, i < 6).await;
            if i < 9 {
                assert!(matches!(outcome, AnswerOutcome::Next { .. }));
            } else {
                let AnswerOutcome::Finished { results, .. } = outcome else {
                    panic!("expected Finished on the last answer");
                };
                assert!(results.message.starts_with("Your result: 6/10"));
                assert!(results.message.contains("Quizzes played: 1"));
                assert!(results.message.contains("Record: 6/10"));
                assert!(results.message.contains("Average accuracy: 60.00%"));
            }
        }

        let progress = controller.progress().await;
        assert_eq!(progress.answered, 10);
        assert_eq!(progress.correct, 6);
        assert!(progress.is_finished);
    }

    #[tokio::test]
    async fn counter_advances_with_each_question() {
        let controller = controller(3);
        let first = controller.start().await.unwrap();
        assert_eq!(first.counter, "1/3");

        let AnswerOutcome::Next { question, .. } = answer(&controller, true).await else {
            panic!("expected Next");
        };
        assert_eq!(question.counter, "2/3");
    }

    #[tokio::test]
    async fn submit_after_reset_is_ignored() {
        let controller = controller(5);
        controller.start().await.unwrap();
        controller.reset().await;

        assert_eq!(
            controller.submit_answer(true).await.unwrap(),
            AnswerOutcome::Ignored
        );
        let progress = controller.progress().await;
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.correct, 0);
        assert_eq!(controller.state().await, SessionState::NotStarted);
    }

    #[tokio::test]
    async fn submit_before_start_is_ignored() {
        let controller = controller(5);
        assert_eq!(
            controller.submit_answer(false).await.unwrap(),
            AnswerOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn reset_during_first_question_fetch_discards_the_result() {
        let images = Arc::new(GatedImages::default());
        images.arm();
        let controller = gated_controller(5, images.clone());

        let starter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.start().await })
        };

        // wait until start() is parked inside the poster fetch
        images.entered.notified().await;
        controller.reset().await;
        images.release.notify_one();

        let result = starter.await.unwrap();
        assert!(matches!(result.unwrap_err(), SessionError::Cancelled));
        assert_eq!(controller.state().await, SessionState::NotStarted);
        let progress = controller.progress().await;
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.correct, 0);
        assert_eq!(progress.total, 0);
    }

    #[tokio::test]
    async fn reset_during_next_question_fetch_discards_the_result() {
        let images = Arc::new(GatedImages::default());
        let controller = gated_controller(5, images.clone());
        controller.start().await.unwrap();

        // only the next-question fetch should park
        images.arm();
        let submitter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit_answer(true).await })
        };

        images.entered.notified().await;
        controller.reset().await;
        images.release.notify_one();

        let result = submitter.await.unwrap();
        assert!(matches!(result.unwrap_err(), SessionError::Cancelled));
        // the stale answer did not leak into the freshly reset session
        assert_eq!(controller.state().await, SessionState::NotStarted);
        let progress = controller.progress().await;
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.correct, 0);

        // and the session can start cleanly afterwards
        images.release.notify_one();
        let view = controller.start().await.unwrap();
        assert_eq!(view.counter, "1/5");
    }

    #[tokio::test]
    async fn reset_clears_catalog_and_allows_restart() {
        let controller = controller(5);
        controller.start().await.unwrap();
        controller.reset().await;

        let view = controller.start().await.unwrap();
        assert_eq!(view.counter, "1/5");
    }

    #[tokio::test]
    async fn finished_session_can_start_again() {
        let controller = controller(2);
        controller.start().await.unwrap();
        answer(&controller, true).await;
        let outcome = answer(&controller, true).await;
        assert!(matches!(outcome, AnswerOutcome::Finished { .. }));

        let view = controller.start().await.unwrap();
        assert_eq!(view.counter, "1/2");
        assert_eq!(controller.progress().await.correct, 0);
    }

    #[tokio::test]
    async fn games_count_increases_by_one_per_finished_session() {
        let catalog = MovieCatalog::new(Arc::new(StubFetcher { movies: movies(2) }));
        let generator = QuestionGenerator::with_seed(Arc::new(StubImages), 11);
        let statistics = StatisticsService::in_memory(fixed_clock());
        let controller = SessionController::new(catalog, generator, statistics.clone());

        for _ in 0..3 {
            controller.start().await.unwrap();
            answer(&controller, true).await;
            answer(&controller, false).await;
        }
        assert_eq!(statistics.games_count().await, 3);
    }
}
