use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

use url::Url;

use services::{
    AnswerOutcome, Clock, HttpImageFetcher, HttpMovieFetcher, MovieCatalog, QuestionGenerator,
    QuestionView, ResultsView, SessionController, StatisticsService,
};
use storage::repository::Storage;

const DEFAULT_API_URL: &str = "https://tv-api.com/en/API/Top250Movies/k_zcuw1ytf";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUrl { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUrl { raw } => write!(f, "invalid --api-url value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

struct Args {
    db_url: String,
    api_url: Url,
    question_limit: Option<usize>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--api-url <url>] [--limit <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --api-url {DEFAULT_API_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_API_URL");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut api_url = std::env::var("QUIZ_API_URL")
            .ok()
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let mut question_limit = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api-url" => {
                    api_url = require_value(args, "--api-url")?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    let parsed: usize = value
                        .parse()
                        .map_err(|_| ArgsError::UnknownArg(format!("--limit {value}")))?;
                    question_limit = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let api_url = Url::parse(&api_url).map_err(|_| ArgsError::InvalidUrl { raw: api_url })?;
        Ok(Self {
            db_url,
            api_url,
            question_limit,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn show_question(view: &QuestionView) {
    println!();
    println!("[{}] {}", view.counter, view.prompt);
    if view.image.is_empty() {
        println!("(no poster available)");
    } else {
        println!("(poster: {} bytes)", view.image.len());
    }
}

fn show_results(view: &ResultsView) {
    println!();
    println!("=== {} ===", view.title);
    println!("{}", view.message);
    println!();
}

fn read_yes_no(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    loop {
        print!("{prompt} [y/n] ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("please answer y or n"),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup so the services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let catalog = MovieCatalog::new(Arc::new(HttpMovieFetcher::new(args.api_url)));
    let generator = QuestionGenerator::new(Arc::new(HttpImageFetcher::new()));
    let statistics = StatisticsService::new(Clock::default_clock(), storage.kv);
    let mut controller = SessionController::new(catalog, generator, statistics);
    if let Some(limit) = args.question_limit {
        controller = controller.with_question_limit(limit);
    }

    loop {
        println!("Loading movies...");
        let first = match controller.start().await {
            Ok(view) => view,
            Err(err) => {
                log::error!("failed to start session: {err}");
                if read_yes_no("Something went wrong. Try again?")? {
                    continue;
                }
                return Ok(());
            }
        };

        show_question(&first);
        loop {
            let given = read_yes_no("Your answer:")?;
            match controller.submit_answer(given).await? {
                AnswerOutcome::Ignored => continue,
                AnswerOutcome::Next {
                    was_correct,
                    question,
                } => {
                    println!("{}", if was_correct { "Correct!" } else { "Wrong." });
                    show_question(&question);
                }
                AnswerOutcome::Finished {
                    was_correct,
                    results,
                } => {
                    println!("{}", if was_correct { "Correct!" } else { "Wrong." });
                    show_results(&results);
                    break;
                }
            }
        }

        if !read_yes_no("Play again?")? {
            return Ok(());
        }
        controller.reset().await;
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
