//! Daily coding-challenge solver.
//!
//! Fetches today's problem, asks a model for a solution, submits it, and
//! retries with the judge's feedback until accepted or out of attempts.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::warn;

use solver::core::extract::extract_code;
use solver::core::types::RunOutcome;
use solver::exit_codes;
use solver::io::config::{Secrets, SolverConfig, apply_env_overrides, load_config};
use solver::io::gemini::GeminiClient;
use solver::io::generator::GeminiGenerator;
use solver::io::init::{InitOptions, SolverPaths, init_solver};
use solver::io::judge::{Judge, LeetCodeJudge};
use solver::io::notify::{LogNotifier, Notifier, SmtpNotifier};
use solver::io::persist::{FileSink, GitSink, SolutionSink};
use solver::io::run_state::load_run_state;
use solver::io::session::JudgeSession;
use solver::logging;
use solver::solve::{Collaborators, SolveOptions, SolveReport, run_solve};

#[derive(Parser)]
#[command(
    name = "solver",
    version,
    about = "Solve the daily coding challenge with a generative model"
)]
struct Cli {
    /// Project root containing `.solver/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.solver/` with a default config.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Fetch, generate, submit and retry until accepted or out of attempts.
    Solve {
        /// Run even if today's problem was already accepted.
        #[arg(short, long)]
        force: bool,
    },
    /// Print today's problem.
    Fetch,
    /// Print the last recorded run.
    Status,
    /// Read model output on stdin and print the extracted code.
    Extract,
}

fn main() {
    logging::init("info");
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.root, force),
        Command::Solve { force } => cmd_solve(&cli.root, force),
        Command::Fetch => cmd_fetch(&cli.root),
        Command::Status => cmd_status(&cli.root),
        Command::Extract => cmd_extract(),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_solver(root, &InitOptions { force })?;
    println!("initialized {}", paths.solver_dir.display());
    Ok(exit_codes::OK)
}

fn load(root: &Path) -> Result<(SolverPaths, SolverConfig)> {
    let paths = SolverPaths::new(root);
    let mut cfg = load_config(&paths.config_path)?;
    apply_env_overrides(&mut cfg)?;
    Ok((paths, cfg))
}

fn cmd_solve(root: &Path, force: bool) -> Result<i32> {
    let (_, cfg) = load(root)?;
    let secrets = Secrets::from_env(&cfg)?;

    let judge = LeetCodeJudge::new(JudgeSession::new(&cfg.judge, &secrets), &cfg.judge)?;
    let client = GeminiClient::new(&cfg.model, secrets.gemini_api_key.clone())?;
    let generator = GeminiGenerator::new(client, cfg.judge.snippet_lang.clone());
    let sink = build_sink(root, &cfg, &secrets);
    let notifier = build_notifier(&cfg, &secrets);

    let report = run_solve(
        root,
        &cfg,
        &Collaborators {
            judge: &judge,
            generator: &generator,
            sink: sink.as_ref(),
            notifier: notifier.as_ref(),
        },
        &SolveOptions {
            force,
            today: Local::now().date_naive(),
        },
    )?;

    match report {
        SolveReport::AlreadySolved { date } => {
            println!("already solved for {date} (use --force to run again)");
            Ok(exit_codes::OK)
        }
        SolveReport::Finished(summary) => match &summary.outcome {
            RunOutcome::Accepted(attempt) => {
                println!(
                    "accepted: {} on attempt {}/{}",
                    summary.problem.title, attempt.index, cfg.retry.max_attempts
                );
                if let Some(receipt) = &summary.receipt {
                    println!("saved: {}", receipt.path.display());
                }
                Ok(exit_codes::OK)
            }
            RunOutcome::Exhausted(failures) => {
                println!(
                    "failed: {} after {} attempts",
                    summary.problem.title,
                    failures.len()
                );
                Ok(exit_codes::EXHAUSTED)
            }
        },
    }
}

fn build_sink(root: &Path, cfg: &SolverConfig, secrets: &Secrets) -> Box<dyn SolutionSink> {
    let persist = &cfg.persist;
    if persist.git.enabled {
        let mut git = persist.git.clone();
        git.repo_dir = root.join(&git.repo_dir);
        Box::new(GitSink::new(
            &git,
            secrets.git_token.clone(),
            persist.layout,
            &persist.base_dir,
            &cfg.judge.extension,
        ))
    } else {
        Box::new(FileSink::new(
            persist.layout,
            root.join(&persist.base_dir),
            &cfg.judge.extension,
        ))
    }
}

fn build_notifier(cfg: &SolverConfig, secrets: &Secrets) -> Box<dyn Notifier> {
    match (&secrets.mail, cfg.mail.enabled) {
        (Some(mail), true) => match SmtpNotifier::new(&cfg.mail, mail) {
            Ok(notifier) => Box::new(notifier),
            Err(err) => {
                warn!(err = %err, "smtp unavailable, notifications will be logged");
                Box::new(LogNotifier)
            }
        },
        _ => Box::new(LogNotifier),
    }
}

fn cmd_fetch(root: &Path) -> Result<i32> {
    let (_, cfg) = load(root)?;
    let secrets = Secrets::judge_from_env()?;
    let judge = LeetCodeJudge::new(JudgeSession::new(&cfg.judge, &secrets), &cfg.judge)?;
    let problem = judge
        .fetch_daily()
        .and_then(|daily| daily.into_problem(&cfg.judge.snippet_lang))
        .context("fetch daily problem")?;

    println!("{} ({})", problem.title, problem.slug);
    println!("id: {}", problem.question_id);
    println!("date: {}", problem.date);
    if let Some(difficulty) = &problem.difficulty {
        println!("difficulty: {difficulty}");
    }
    println!();
    println!("{}", problem.statement);
    println!();
    println!("{}", problem.template);
    Ok(exit_codes::OK)
}

fn cmd_status(root: &Path) -> Result<i32> {
    let (paths, _) = load(root)?;
    match load_run_state(&paths.run_state_path)? {
        Some(state) => println!(
            "last run: {} ({}) at {}",
            state.date,
            if state.success { "accepted" } else { "not accepted" },
            state.timestamp.to_rfc3339()
        ),
        None => println!("no runs recorded"),
    }
    Ok(exit_codes::OK)
}

fn cmd_extract() -> Result<i32> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("read stdin")?;
    println!("{}", extract_code(&input));
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["solver", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn parse_solve_force_with_root() {
        let cli = Cli::parse_from(["solver", "solve", "--force", "--root", "/tmp/x"]);
        assert!(matches!(cli.command, Command::Solve { force: true }));
        assert_eq!(cli.root, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn parse_read_only_commands() {
        assert!(matches!(
            Cli::parse_from(["solver", "fetch"]).command,
            Command::Fetch
        ));
        assert!(matches!(
            Cli::parse_from(["solver", "status"]).command,
            Command::Status
        ));
        assert!(matches!(
            Cli::parse_from(["solver", "extract"]).command,
            Command::Extract
        ));
    }
}
