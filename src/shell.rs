use async_trait::async_trait;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, Span};

use crate::error::CommandError;

/// The one boundary to the outside world: run a command line, get back the
/// interleaved stdout/stderr.
#[mockall::automock]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String, CommandError>;
}

/// Runs commands through `sh -c`.
pub struct ShellExecutor {
    span: Span,
}

impl ShellExecutor {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

/// Sends stderr into the same pipe as stdout before the command runs, so the
/// captured text keeps the order the process wrote it in.
fn merged_script(command: &str) -> String {
    format!("exec 2>&1\n{command}")
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str) -> Result<String, CommandError> {
        debug!(parent: &self.span, command, "running command");

        let output = AsyncCommand::new("sh")
            .arg("-c")
            .arg(merged_script(command))
            .output()
            .await
            .map_err(|source| CommandError::Launch {
                command: command.to_string(),
                source,
            })?;

        let combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            debug!(parent: &self.span, command, status = %output.status, "command failed");
            return Err(CommandError::Exit {
                command: command.to_string(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        debug!(parent: &self.span, command, output = %combined.trim_end(), "command finished");
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandSet;
    use crate::types::OperationKind;

    fn executor() -> ShellExecutor {
        ShellExecutor::new(Span::none())
    }

    #[tokio::test]
    async fn merges_stderr_into_output_in_order() {
        let output = executor()
            .execute("echo first; echo second >&2; echo third")
            .await
            .unwrap();

        assert_eq!(output, "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn failure_keeps_partial_output() {
        let err = executor()
            .execute("echo partial; echo oops >&2; exit 3")
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::Exit { .. }));
        assert_eq!(err.output(), "partial\noops\n");
    }

    #[tokio::test]
    async fn quoted_values_reach_the_program_as_one_argument() {
        let commands = CommandSet {
            kubectl: "kubectl".to_string(),
            velero: "echo".to_string(),
        };
        let command = commands.describe(OperationKind::Backup, "x; echo injected; it's");

        let output = executor().execute(&command).await.unwrap();

        assert_eq!(output, "backup describe x; echo injected; it's --details -o json\n");
    }
}
