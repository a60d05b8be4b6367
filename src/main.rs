use vocab_srs::*;

use analytics::{challenging_words, learner_stats, review_activity};
use app::run_session;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, ConfigOverrides};
use database::db::{self, NewWord};
use display::{format_date, format_interval};
use export::json::{export_json_to_path, import_json};
use std::io;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Spaced-repetition scheduler for a vocabulary collection
#[derive(Parser)]
#[command(name = "vocab-srs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SM-2 review scheduling for vocabulary learners")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Learner whose collection to use
    #[arg(long, global = true)]
    learner: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a word to the collection
    Add {
        term: String,
        #[arg(default_value = "")]
        definition: String,
        #[arg(long, default_value = "")]
        language: String,
        #[arg(long, default_value = "")]
        part_of_speech: String,
    },

    /// List words due for review
    Due {
        /// Maximum number of words to list
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Review due words interactively; failed words repeat until passed
    Session {
        /// Maximum number of words to review
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record a review for a word (quality 0-5)
    Review {
        word_id: i64,
        #[arg(allow_negative_numbers = true)]
        quality: i64,
    },

    /// Set a word's mastery stage (ghost, liquid, solid)
    Stage { word_id: i64, stage: MasteryStage },

    /// Show learning statistics
    Stats {
        /// Days of review activity to show
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Show words with the lowest ease factor
    Challenging {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the review log for a word
    History { word_id: i64 },

    /// Move the simulated date forward
    AdvanceDay {
        #[arg(default_value = "1")]
        days: u32,
    },

    /// Export the collection to JSON
    Export { output: PathBuf },

    /// Import a JSON export into the collection
    Import { input: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(
        cli.config.as_deref(),
        ConfigOverrides {
            database_path: cli.db.clone(),
            learner_id: cli.learner,
            due_limit: None,
        },
    ) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli.command, &config) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let mut conn = db::init_database(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let now = db::get_current_date(&conn)?;
    let learner = config.learner_id;

    match command {
        Commands::Add {
            term,
            definition,
            language,
            part_of_speech,
        } => {
            let id = db::add_word(
                &conn,
                learner,
                &NewWord {
                    term: &term,
                    definition: &definition,
                    language: &language,
                    part_of_speech: &part_of_speech,
                },
                now,
            )?;
            println!("{id}\t{term}");
        }

        Commands::Due { limit } => {
            let limit = limit.unwrap_or(config.due_limit);
            let words = db::due_words(&conn, learner, now, &config.exclude_stages, Some(limit))?;
            println!("{} ({} due)", format_date(now), words.len());
            for word in words {
                let when = word
                    .state
                    .next_review_at
                    .map(format_date)
                    .unwrap_or_else(|| "new".to_string());
                println!("{}\t{}\t{}\t{}", word.id, word.term, word.definition, when);
            }
        }

        Commands::Session { limit } => {
            let limit = limit.unwrap_or(config.due_limit);
            let words = db::due_words(&conn, learner, now, &config.exclude_stages, Some(limit))?;
            if words.is_empty() {
                println!("Nothing due on {}", format_date(now));
                return Ok(());
            }

            let mut session = ReviewSession::new(words);
            let stdin = io::stdin().lock();
            let summary = run_session(&mut conn, &mut session, now, stdin, io::stdout())?;
            println!(
                "{} reviews over {} rounds{}",
                summary.reviews,
                summary.rounds,
                if summary.completed { ", all passed" } else { "" }
            );
        }

        Commands::Review { word_id, quality } => {
            let quality = Quality::new(quality)?;
            let outcome = db::submit_review(&mut conn, word_id, quality, now)?;
            println!("{}", outcome.message);
            println!(
                "ease {:.2}, streak {}, next review {} ({})",
                outcome.word.state.ease_factor,
                outcome.word.state.repetition_count,
                outcome
                    .word
                    .state
                    .next_review_at
                    .map(format_date)
                    .unwrap_or_default(),
                format_interval(outcome.next_interval)
            );
        }

        Commands::Stage { word_id, stage } => {
            db::set_mastery_stage(&conn, word_id, stage, now)?;
            println!("{word_id}\t{stage}");
        }

        Commands::Stats { days } => {
            let stats = learner_stats(&conn, learner, now, &config.exclude_stages)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            for day in review_activity(&conn, learner, days, now)? {
                println!("{}\t{}", day.date, day.reviews);
            }
        }

        Commands::Challenging { limit } => {
            let limit = limit.unwrap_or(config.challenging_limit);
            for word in challenging_words(&conn, learner, limit)? {
                println!(
                    "{}\t{}\t{:.2}\t{}",
                    word.word_id, word.term, word.ease_factor, word.repetition_count
                );
            }
        }

        Commands::History { word_id } => {
            for event in db::review_history(&conn, word_id)? {
                println!(
                    "{}\tq={}\t{:.2} -> {:.2}\t{}",
                    format_date(event.reviewed_at),
                    event.quality,
                    event.ease_before,
                    event.ease_after,
                    format_interval(event.interval_after)
                );
            }
        }

        Commands::AdvanceDay { days } => {
            let date = db::advance_day(&conn, days)?;
            println!("{}", format_date(date));
        }

        Commands::Export { output } => {
            let count = export_json_to_path(&conn, learner, &output, now)?;
            println!("Exported {count} words to {}", output.display());
        }

        Commands::Import { input } => {
            let summary = import_json(&mut conn, learner, &input)?;
            println!(
                "Imported {} words, skipped {}",
                summary.imported, summary.skipped
            );
        }
    }

    Ok(())
}
