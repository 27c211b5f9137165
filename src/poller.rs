use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::sync::watch;
use tracing::{debug, info, Span};

use crate::commands::CommandSet;
use crate::error::{Result, WizardError};
use crate::shell::CommandExecutor;
use crate::types::{OperationKind, Phase};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

fn phase_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""[Pp]hase"\s*:\s*"([A-Za-z]*)""#).expect("phase pattern is valid")
    })
}

/// Reads the phase out of `velero <kind> describe --details -o json` output.
pub fn phase_of(status: &str) -> Phase {
    phase_pattern()
        .captures(status)
        .and_then(|captures| captures.get(1))
        .map(|phase| Phase::from_reported(phase.as_str()))
        .unwrap_or(Phase::Unknown)
}

/// Describes an operation every `interval` until velero reports it finished.
pub struct CompletionPoller<'a> {
    executor: &'a dyn CommandExecutor,
    commands: &'a CommandSet,
    interval: Duration,
    span: Span,
}

impl<'a> CompletionPoller<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        commands: &'a CommandSet,
        interval: Duration,
        span: Span,
    ) -> Self {
        Self {
            executor,
            commands,
            interval,
            span,
        }
    }

    /// Polls without an upper bound. Only the wait between queries observes
    /// `cancel`; a query already running is allowed to finish.
    pub async fn await_completion(
        &self,
        kind: OperationKind,
        name: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        let command = self.commands.describe(kind, name);
        loop {
            if *cancel.borrow() {
                return Err(cancelled(kind, name));
            }

            let status = self
                .executor
                .execute(&command)
                .await
                .map_err(WizardError::Status)?;

            match phase_of(&status) {
                Phase::Completed => {
                    info!(parent: &self.span, %kind, name, "operation completed");
                    return Ok(());
                }
                Phase::Failed(phase) => {
                    info!(parent: &self.span, %kind, name, %phase, "operation failed");
                    return Err(WizardError::OperationFailed {
                        kind,
                        name: name.to_string(),
                    });
                }
                phase => {
                    debug!(parent: &self.span, %kind, name, ?phase, "operation still running");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                Ok(()) = cancel.changed() => {
                    if *cancel.borrow() {
                        return Err(cancelled(kind, name));
                    }
                }
            }
        }
    }
}

fn cancelled(kind: OperationKind, name: &str) -> WizardError {
    WizardError::Cancelled {
        kind,
        name: name.to_string(),
    }
}
