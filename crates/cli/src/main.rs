use std::{
    fs::{self, OpenOptions},
    path::Path,
};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt::MakeWriter, prelude::*, EnvFilter};

use golf18_core::{
    catalog::{self, CourseInput},
    config::{self, AppConfig},
    feedback::TracingFeedback,
    scoring::{over_par_series, ScoreLabel},
    Course, FollowUp, Outcome, OutcomeChoice, RoundManager, RoundState, JsonFileStore,
};

#[derive(Debug, Parser)]
#[command(name = "golf18", about = "Keep score of golf rounds hole by hole")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List courses.
    Courses,
    /// Add a course. Lists accept any separator; bad lists fall back to defaults.
    AddCourse {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        pars: String,
        #[arg(long, default_value = "")]
        stroke_index: String,
        #[arg(long, default_value = "")]
        distances: String,
    },
    /// Add the built-in sample course.
    AddSampleCourse,
    /// Delete a course and every round played on it.
    DeleteCourse { course: String },
    /// Start a round on a course (id or name prefix).
    Start { course: String },
    /// Record a hole, all shots marked good.
    Hole {
        number: u8,
        #[arg(long)]
        strokes: Option<usize>,
        #[arg(long)]
        putts: Option<usize>,
    },
    /// Set today's distance for a hole; omit yards to clear it.
    Distance { hole: u8, yards: Option<u32> },
    /// Show the summary of the active round.
    Review,
    /// Go back from the summary to the round.
    Resume,
    /// Complete the round under review.
    Finalize,
    /// List completed rounds.
    Rounds,
    /// Reopen a completed round for editing.
    EditRound { id: String },
    /// Drop edits to a reopened round.
    DiscardEdits,
    /// Delete a round.
    DeleteRound { id: String },
    /// Set the handicap (0-54); anything else clears it.
    Handicap { value: String },
    /// Statistics for a hole of the active course.
    History { hole: u8 },
    /// Show the active round.
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config::ensure_default_config()?;
    let config = load_config(&config_path, std::io::stderr);
    init_logging(&config)?;

    let store = JsonFileStore::new(config.data_root.clone());
    let mut manager = RoundManager::open(Box::new(store), Box::new(TracingFeedback), &config)?;

    run(&mut manager, cli.command)
}

fn run(manager: &mut RoundManager, command: Command) -> Result<()> {
    match command {
        Command::Courses => {
            for course in manager.courses() {
                println!("{}  {} (par {})", course.id, course.name, course.total_par());
            }
        }
        Command::AddCourse {
            name,
            pars,
            stroke_index,
            distances,
        } => {
            let course = manager.create_course(&CourseInput {
                name,
                pars,
                stroke_indexes: stroke_index,
                distances,
            })?;
            println!("added {} ({})", course.name, course.id);
        }
        Command::AddSampleCourse => {
            let course = catalog::sample_course();
            let label = format!("{} ({})", course.name, course.id);
            manager.add_course(course)?;
            println!("added {label}");
        }
        Command::DeleteCourse { course } => {
            let id = find_course(manager, &course)?.id.clone();
            manager.delete_course(&id);
            println!("deleted course {id}");
        }
        Command::Start { course } => {
            let id = find_course(manager, &course)?.id.clone();
            let round = manager.select_course(&id)?;
            println!("round {} started on {}", round.id, round.course_name);
        }
        Command::Hole {
            number,
            strokes,
            putts,
        } => record_hole(manager, number, strokes, putts)?,
        Command::Distance { hole, yards } => {
            manager.update_todays_distance(hole, yards)?;
        }
        Command::Review => {
            if matches!(manager.state(), RoundState::InProgress { .. }) {
                manager.review_round(None)?;
            }
            print_summary(manager)?;
        }
        Command::Resume => {
            let hole = manager.return_to_round()?;
            println!("back on hole {hole}");
        }
        Command::Finalize => {
            let round = manager.finalize_round()?;
            println!(
                "round {} complete: {} strokes (par {})",
                round.id, round.total_score, round.total_par
            );
        }
        Command::Rounds => {
            for round in manager.rounds() {
                let finished = round
                    .completed_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!(
                    "{}  {}  {}  {}/{}",
                    round.id, finished, round.course_name, round.total_score, round.total_par
                );
            }
        }
        Command::EditRound { id } => {
            manager.edit_past_round(&id)?;
            print_summary(manager)?;
        }
        Command::DiscardEdits => manager.discard_edits()?,
        Command::DeleteRound { id } => {
            if !manager.delete_round(&id) {
                println!("no round {id}");
            }
        }
        Command::Handicap { value } => {
            manager.set_handicap(catalog::parse_handicap(&value));
            match manager.settings().handicap {
                Some(handicap) => println!("handicap {handicap}"),
                None => println!("handicap cleared"),
            }
        }
        Command::History { hole } => {
            let history = manager.hole_history(hole)?;
            println!(
                "hole {}: {} rounds, average {:.1}, best {}, worst {}",
                history.hole_number,
                history.total_rounds,
                history.average_score,
                history.best_score,
                history.worst_score
            );
            for (position, counts) in history.position_outcomes() {
                let tallies: Vec<String> = counts
                    .iter()
                    .map(|(outcome, count)| format!("{outcome:?}={count}"))
                    .collect();
                println!("  {position}: {}", tallies.join(" "));
            }
        }
        Command::Status => match manager.current_round() {
            Some(round) => {
                println!("{} on {}: {}", round.id, round.course_name, manager.state());
                print_summary(manager)?;
            }
            None => println!("no active round"),
        },
    }
    Ok(())
}

fn find_course<'a>(manager: &'a RoundManager, query: &str) -> Result<&'a Course> {
    let needle = query.trim().to_lowercase();
    manager
        .courses()
        .iter()
        .find(|course| course.id == query || course.name.to_lowercase().starts_with(&needle))
        .ok_or_else(|| anyhow!("no course matches {query:?}"))
}

fn record_hole(
    manager: &mut RoundManager,
    number: u8,
    strokes: Option<usize>,
    putts: Option<usize>,
) -> Result<()> {
    let mut working = manager.open_hole(number)?;
    let target_strokes = strokes.unwrap_or(working.strokes().len());
    let target_putts = putts.unwrap_or(working.putts().len());
    if target_strokes + target_putts == 0 {
        bail!("a hole needs at least one shot");
    }

    let good = OutcomeChoice::Direction(Outcome::Good);
    while working.strokes().len() < target_strokes {
        let id = manager.add_stroke(&mut working);
        manager.select_outcome(&mut working, &id, good, FollowUp::Skip)?;
    }
    while working.putts().len() < target_putts {
        let id = manager.add_putt(&mut working);
        manager.select_outcome(&mut working, &id, good, FollowUp::Skip)?;
    }
    while working.strokes().len() > target_strokes {
        let id = working.strokes()[working.strokes().len() - 1].id.clone();
        manager.remove_shot(&mut working, &id)?;
    }
    while working.putts().len() > target_putts {
        let id = working.putts()[working.putts().len() - 1].id.clone();
        manager.remove_shot(&mut working, &id)?;
    }

    manager.complete_hole(&working)?;
    let over_par = manager.over_par(number, None)?;
    println!(
        "hole {number}: {} shots, {:+} gross, {:+} net",
        working.len(),
        over_par.gross,
        over_par.net
    );
    Ok(())
}

fn print_summary(manager: &RoundManager) -> Result<()> {
    let summary = manager.summary()?;
    let round = manager
        .current_round()
        .ok_or_else(|| anyhow!("no active round"))?;
    let course = manager.current_course()?;
    let series = over_par_series(round, course, manager.settings().handicap);

    for score in &round.hole_scores {
        let running = series[usize::from(score.hole_number) - 1];
        println!(
            "{:>2}  par {}  {:>2}  {:<12}  {:+} / {:+}",
            score.hole_number,
            score.par,
            score.total_score,
            format!("{:?}", ScoreLabel::from(score)),
            running.gross,
            running.net
        );
    }
    println!(
        "holes {}  out {}  in {}  total {} ({:+})  net {:+}",
        summary.holes_played,
        summary.front_nine,
        summary.back_nine,
        summary.total_score,
        summary.net_score,
        summary.over_par.net
    );
    println!(
        "under {}  level {}  over {}  putts {}  fire {}  poor {}  penalties {}",
        summary.under_par_holes,
        summary.at_par_holes,
        summary.over_par_holes,
        summary.total_putts,
        summary.fire_shots,
        summary.poor_shots,
        summary.penalties
    );
    Ok(())
}

/// Load the config while a minimal subscriber is active, so fallback
/// warnings are not lost before the real logging is set up.
fn load_config<W>(path: &Path, make_writer: W) -> AppConfig
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(make_writer)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .finish();
    tracing::subscriber::with_default(bootstrap, || AppConfig::load_from(path))
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("golf18.log");

    let env_filter = EnvFilter::from_default_env();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
