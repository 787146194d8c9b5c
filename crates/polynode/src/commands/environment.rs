//! Commands that connect the active slot to the user's shell.

use std::path::{Path, PathBuf};

use log::{debug, info};
use polynode_core::{ActiveTracker, PolynodeConfig};

use crate::error::{AppError, Result};

pub fn init(config: &PolynodeConfig) -> Result<()> {
    let layout = &config.layout;
    layout.ensure_dirs().map_err(|error| {
        AppError::io(format!("failed to create {}", layout.root.display()), error)
    })?;

    let runtime_dir = config.platform.runtime_dir(&layout.current);
    let (file_name, contents) = config.platform.setenv_script(&runtime_dir);
    let script = layout.root.join(file_name);
    std::fs::write(&script, contents)
        .map_err(|error| AppError::io(format!("failed to write {}", script.display()), error))?;
    info!("Wrote {}", script.display());

    println!("Initialized {}", layout.root.display());
    println!("Add the active runtime to PATH with:");
    println!("  {}", config.platform.path_command(&runtime_dir));
    println!("or run {}", script.display());
    Ok(())
}

pub async fn shell(config: &PolynodeConfig) -> Result<()> {
    let active = ActiveTracker::new(&config.layout)
        .get_active()
        .ok_or(AppError::NoActiveVersion)?;

    let runtime_dir = config.platform.runtime_dir(&config.layout.current);
    let program = config.platform.shell_program(std::env::var_os("SHELL"));
    let path = config
        .platform
        .prepend_path(&runtime_dir, std::env::var_os("PATH").as_ref());

    println!("Starting {} with node {active}", program.to_string_lossy());
    println!("Exit the shell to return");
    debug!("PATH={}", path.to_string_lossy());

    let status = tokio::process::Command::new(&program)
        .env("PATH", path)
        .env("POLYNODE_SHELL", "true")
        .env("POLYNODE_VERSION", &active)
        .status()
        .await
        .map_err(|error| {
            AppError::io(format!("failed to start {}", program.to_string_lossy()), error)
        })?;

    debug!("Shell exited with {status}");
    Ok(())
}

/// Where the first `node` on `PATH` comes from.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PathCheck {
    NotFound,
    Shadowed { first: PathBuf },
    Active { others: usize },
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub(crate) fn evaluate_path(found: &[PathBuf], expected: &Path) -> PathCheck {
    match found.split_first() {
        None => PathCheck::NotFound,
        Some((first, _)) if !same_file(first, expected) => PathCheck::Shadowed {
            first: first.clone(),
        },
        Some((_, rest)) => PathCheck::Active { others: rest.len() },
    }
}

pub fn check(config: &PolynodeConfig) -> Result<()> {
    let tracker = ActiveTracker::new(&config.layout);
    match tracker.get_active() {
        Some(active) => println!("Active version: {active}"),
        None => println!("No active version"),
    }

    let expected = config.platform.runtime_executable(&config.layout.current);
    let found: Vec<PathBuf> = which::which_all("node")
        .map(|paths| paths.collect())
        .unwrap_or_default();
    debug!("node on PATH: {found:?}");

    let fix = config
        .platform
        .path_command(&config.platform.runtime_dir(&config.layout.current));
    match evaluate_path(&found, &expected) {
        PathCheck::NotFound => {
            println!("node was not found on PATH. Update it with:");
            println!("  {fix}");
        }
        PathCheck::Shadowed { first } => {
            println!("node on PATH resolves to {}", first.display());
            println!("expected {}. Update PATH with:", expected.display());
            println!("  {fix}");
        }
        PathCheck::Active { others } => {
            println!("node on PATH resolves to {}", expected.display());
            if others > 0 {
                println!(
                    "{others} other node installation(s) are also on PATH; consider removing them"
                );
            }
        }
    }

    if let Some(reported) = tracker.probe_runtime_version(&config.platform) {
        println!("Runtime reports {reported}");
    }
    Ok(())
}
