//! Initialization helpers for `.solver/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{SolverConfig, write_config};

/// All canonical paths within `.solver/` for a project root.
#[derive(Debug, Clone)]
pub struct SolverPaths {
    pub root: PathBuf,
    pub solver_dir: PathBuf,
    pub state_dir: PathBuf,
    pub attempts_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub config_path: PathBuf,
    pub run_state_path: PathBuf,
}

impl SolverPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let solver_dir = root.join(".solver");
        let state_dir = solver_dir.join("state");
        Self {
            root: root.clone(),
            solver_dir: solver_dir.clone(),
            state_dir: state_dir.clone(),
            attempts_dir: solver_dir.join("attempts"),
            gitignore_path: solver_dir.join(".gitignore"),
            config_path: solver_dir.join("config.toml"),
            run_state_path: state_dir.join("run_state.json"),
        }
    }
}

/// Options for `init_solver`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing solver-owned files.
    pub force: bool,
}

/// Create `.solver/` scaffolding with a default config in `root`.
///
/// Fails if `.solver/` already exists unless `options.force` is set.
pub fn init_solver(root: &Path, options: &InitOptions) -> Result<SolverPaths> {
    let paths = SolverPaths::new(root);
    if paths.solver_dir.exists() && !paths.solver_dir.is_dir() {
        return Err(anyhow!("solver init: .solver exists but is not a directory"));
    }
    if paths.solver_dir.exists() && !options.force {
        return Err(anyhow!(
            "solver init: .solver already exists (use --force to overwrite)"
        ));
    }

    create_dir(&paths.solver_dir)?;
    create_dir(&paths.state_dir)?;
    create_dir(&paths.attempts_dir)?;

    fs::write(&paths.gitignore_path, SOLVER_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;
    write_config(&paths.config_path, &SolverConfig::default())?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

const SOLVER_GITIGNORE: &str = "state/\nattempts/\n";
