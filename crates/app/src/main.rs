use std::fmt;

use gateway::HttpGatewayConfig;
use services::{AppServices, Clock};
use tracker_core::aggregate::{
    OverallProgress, ProjectFilter, completed_project_ids, compute_stage_progress, filter_projects,
};
use tracker_core::model::{Difficulty, ProjectId, Stage, Track};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { what: &'static str },
    UnknownArg(String),
    InvalidTrack { raw: String },
    InvalidStage { raw: String },
    InvalidDifficulty { raw: String },
    InvalidProjectId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { what } => write!(f, "missing operand: {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTrack { raw } => write!(f, "invalid --track value: {raw}"),
            ArgsError::InvalidStage { raw } => write!(f, "invalid --stage value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw}")
            }
            ArgsError::InvalidProjectId { raw } => write!(f, "invalid project id: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- projects [--track <t>] [--search <term>] [--stage <1-4>] [--difficulty <d>]");
    eprintln!("  cargo run -p app -- stats    [--track <t>]");
    eprintln!("  cargo run -p app -- toggle   <project-id> [--track <t>]");
    eprintln!("  cargo run -p app -- notes    <project-id> <text> [--track <t>]");
    eprintln!("  cargo run -p app -- links    <project-id> <github> <learning> [--track <t>]");
    eprintln!();
    eprintln!("Tracks: php (default), html-css, react");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRACKER_API_URL, TRACKER_API_KEY   backend endpoint (required)");
    eprintln!("  TRACKER_EMAIL, TRACKER_PASSWORD    sign-in credentials (required for writes)");
    eprintln!("  TRACKER_TRACK                      default track");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Projects,
    Stats,
    Toggle,
    Notes,
    Links,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "projects" => Some(Self::Projects),
            "stats" => Some(Self::Stats),
            "toggle" => Some(Self::Toggle),
            "notes" => Some(Self::Notes),
            "links" => Some(Self::Links),
            _ => None,
        }
    }

    fn mutates(self) -> bool {
        matches!(self, Self::Toggle | Self::Notes | Self::Links)
    }
}

struct Args {
    track: Track,
    filter: ProjectFilter,
    operands: Vec<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut track = std::env::var("TRACKER_TRACK")
            .ok()
            .and_then(|value| value.parse::<Track>().ok())
            .unwrap_or(Track::Php);
        let mut filter = ProjectFilter::all();
        let mut operands = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--track" => {
                    let value = require_value(args, "--track")?;
                    track = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTrack { raw: value })?;
                }
                "--search" => {
                    let value = require_value(args, "--search")?;
                    filter = filter.with_search(value);
                }
                "--stage" => {
                    let value = require_value(args, "--stage")?;
                    let stage = value
                        .parse::<u8>()
                        .ok()
                        .and_then(|n| Stage::new(n).ok())
                        .ok_or(ArgsError::InvalidStage { raw: value })?;
                    filter = filter.with_stage(stage);
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    let difficulty: Difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value })?;
                    filter = filter.with_difficulty(difficulty);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(ArgsError::UnknownArg(arg));
                }
                _ => operands.push(arg),
            }
        }

        Ok(Self {
            track,
            filter,
            operands,
        })
    }

    fn project_id(&self) -> Result<ProjectId, ArgsError> {
        let raw = self
            .operands
            .first()
            .ok_or(ArgsError::MissingOperand { what: "project id" })?;
        raw.parse()
            .map_err(|_| ArgsError::InvalidProjectId { raw: raw.clone() })
    }

    fn operand(&self, index: usize, what: &'static str) -> Result<&str, ArgsError> {
        self.operands
            .get(index)
            .map(String::as_str)
            .ok_or(ArgsError::MissingOperand { what })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = HttpGatewayConfig::from_env().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "TRACKER_API_URL and TRACKER_API_KEY must be set",
        )
    })?;
    let app = AppServices::new_http(config, Clock::default_clock(), parsed.track);

    let email = std::env::var("TRACKER_EMAIL").ok();
    let password = std::env::var("TRACKER_PASSWORD").ok();
    match (email, password) {
        (Some(email), Some(password)) => {
            app.auth().sign_in(&email, &password).await?;
        }
        _ if cmd.mutates() => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "TRACKER_EMAIL and TRACKER_PASSWORD must be set for writes",
            )
            .into());
        }
        _ => {}
    }

    let store = app.progress_store();
    store.switch_track(parsed.track).await?;

    match cmd {
        Command::Projects => {
            let snapshot = store.snapshot();
            let completed = completed_project_ids(&snapshot.records);
            let hits = filter_projects(&snapshot.projects, &parsed.filter);
            for project in &hits {
                let mark = if completed.contains(&project.id()) {
                    'x'
                } else {
                    ' '
                };
                println!(
                    "[{mark}] #{:<4} s{} {:<8} {}",
                    project.id(),
                    project.stage(),
                    project.difficulty(),
                    project.title()
                );
            }
            if hits.is_empty() {
                println!("no projects match the current filters");
            }
        }
        Command::Stats => {
            let snapshot = store.snapshot();
            let completed = completed_project_ids(&snapshot.records);
            let overall = OverallProgress::compute(&snapshot.projects, &completed);
            println!(
                "{}: {}/{} completed ({}%), {} remaining",
                parsed.track,
                overall.completed,
                overall.total,
                overall.percent(),
                overall.remaining()
            );
            let rollup = compute_stage_progress(&snapshot.projects, &completed);
            for (stage, count) in rollup.iter() {
                println!(
                    "  stage {stage}: {}/{} ({}%)",
                    count.completed,
                    count.total,
                    count.percent()
                );
            }
        }
        Command::Toggle => {
            let project_id = parsed.project_id()?;
            let outcome = store.toggle_completion(project_id).await?;
            if outcome.newly_completed {
                // celebration only after the write is confirmed
                println!("project #{project_id} completed, nice work!");
            } else {
                println!("project #{project_id} marked incomplete");
            }
        }
        Command::Notes => {
            let project_id = parsed.project_id()?;
            let text = parsed.operand(1, "notes text")?;
            let record = store.update_notes(project_id, text).await?;
            println!("notes saved for project #{}", record.project_id());
        }
        Command::Links => {
            let project_id = parsed.project_id()?;
            let github = parsed.operand(1, "github link")?;
            let learning = parsed.operand(2, "learning link")?;
            let record = store.update_links(project_id, github, learning).await?;
            println!("links saved for project #{}", record.project_id());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let log_level =
        std::env::var("TRACKER_LOG").unwrap_or_else(|_| "info,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
