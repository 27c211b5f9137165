use thiserror::Error;

use crate::types::OperationKind;

/// Failure of a single external command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {}", .output.trim())]
    Exit {
        command: String,
        status: String,
        output: String,
    },
}

impl CommandError {
    /// Combined output produced before the failure, if any.
    pub fn output(&self) -> &str {
        match self {
            CommandError::Launch { .. } => "",
            CommandError::Exit { output, .. } => output,
        }
    }
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("error fetching {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: CommandError,
    },

    #[error("error parsing {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} selected")]
    EmptySelection(&'static str),

    #[error("no {0} available to select")]
    NothingToSelect(&'static str),

    #[error("error executing command: {0}")]
    Dispatch(#[source] CommandError),

    #[error("error waiting for completion: {0}")]
    Status(#[source] CommandError),

    #[error("{kind} {name} failed")]
    OperationFailed { kind: OperationKind, name: String },

    #[error("stopped waiting for {kind} {name}")]
    Cancelled { kind: OperationKind, name: String },
}

impl WizardError {
    /// Only selection mistakes leave the session running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WizardError::EmptySelection(_) | WizardError::NothingToSelect(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;
