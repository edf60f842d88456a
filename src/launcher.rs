use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::catalog::CatalogEntry;
use crate::config::LauncherConfig;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Entry point {0} does not exist")]
    MissingEntryPoint(PathBuf),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed waiting for {name}: {source}")]
    Wait {
        name: String,
        source: std::io::Error,
    },
}

/// How a launched application ended
#[derive(Debug, Clone, Copy)]
pub struct LaunchOutcome {
    pub status: ExitStatus,
    pub elapsed: Duration,
}

/// Runs catalog entries as child processes, one at a time, to completion
#[derive(Debug, Clone)]
pub struct Launcher {
    interpreter: String,
    entry_point: String,
}

impl Launcher {
    pub fn new(interpreter: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(&config.interpreter, &config.entry_point)
    }

    /// `<interpreter> <entry_point>`, run from inside the entry's directory
    fn command(&self, entry: &CatalogEntry) -> Command {
        let mut command = Command::new(&self.interpreter);
        command.arg(&self.entry_point).current_dir(entry.dir());
        command
    }

    /// Starts `entry` and blocks until it exits
    pub fn run(&self, entry: &CatalogEntry) -> Result<LaunchOutcome, LaunchError> {
        let script = entry.dir().join(&self.entry_point);
        if !script.is_file() {
            return Err(LaunchError::MissingEntryPoint(script));
        }

        info!("Launching {} ({})", entry.label(), script.display());
        let started = Instant::now();

        let mut child = self.command(entry).spawn().map_err(|source| LaunchError::Spawn {
            program: self.interpreter.clone(),
            source,
        })?;
        let status = child.wait().map_err(|source| LaunchError::Wait {
            name: entry.name().to_string(),
            source,
        })?;

        let outcome = LaunchOutcome {
            status,
            elapsed: started.elapsed(),
        };
        if status.success() {
            info!(
                "{} exited after {:.1}s",
                entry.label(),
                outcome.elapsed.as_secs_f32()
            );
        } else {
            warn!("{} exited with {}", entry.label(), status);
        }
        Ok(outcome)
    }

    /// Runs `entry`, logging instead of returning failures so the wheel can
    /// carry on
    pub fn run_logged(&self, entry: &CatalogEntry) -> Option<LaunchOutcome> {
        match self.run(entry) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Launch of {} failed: {}", entry.name(), e);
                None
            }
        }
    }
}
