#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod session;
pub mod statistics;
pub mod view;

pub use quiz_core::Clock;

pub use catalog::MovieCatalog;
pub use error::{FetchError, GeneratorError, LoadError, SessionError};
pub use fetch::{HttpImageFetcher, HttpMovieFetcher, ImageFetcher, MovieFetcher};
pub use generator::QuestionGenerator;
pub use session::{AnswerOutcome, SessionController, SessionProgress, SessionState};
pub use statistics::StatisticsService;
pub use view::{QuestionView, ResultsView};
