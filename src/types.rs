use std::fmt;

/// A selectable row: operations, contexts, namespaces, resources, backups and
/// yes/no decisions are all shown as one of these.
#[derive(Debug, Clone)]
pub struct Item {
    title: String,
    description: String,
}

impl Item {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self::new(title, "")
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Identity used for selection and de-duplication.
    pub fn filter_value(&self) -> &str {
        &self.title
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
    }
}

impl Eq for Item {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Backup,
    Restore,
}

impl OperationKind {
    pub const ALL: [OperationKind; 2] = [OperationKind::Backup, OperationKind::Restore];

    /// The velero sub-command noun for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Backup => "backup",
            OperationKind::Restore => "restore",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OperationKind::Backup => "Backup",
            OperationKind::Restore => "Restore",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::Backup => "Create a velero backup",
            OperationKind::Restore => "Restore a velero backup",
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.title() == title)
    }

    pub fn item(&self) -> Item {
        Item::new(self.title(), self.description())
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase reported by `velero <kind> describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Completed,
    Failed(String),
    InProgress(String),
    Unknown,
}

impl Phase {
    pub fn from_reported(phase: &str) -> Self {
        match phase {
            "Completed" => Phase::Completed,
            "Failed" | "PartiallyFailed" | "FailedValidation" => Phase::Failed(phase.to_string()),
            "" => Phase::Unknown,
            other => Phase::InProgress(other.to_string()),
        }
    }
}

/// Identifier of a wizard step, for the presentation layer and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepId {
    ChooseOperation,
    ChooseExistingBackup,
    ChooseContext,
    ChooseNamespaces,
    DecideSpecificResources,
    ChooseResources,
    EnterName,
    Execute,
    Terminal,
}

impl StepId {
    pub fn title(&self) -> &'static str {
        match self {
            StepId::ChooseOperation => "Select Operation",
            StepId::ChooseExistingBackup => "Select Backup",
            StepId::ChooseContext => "Select Context",
            StepId::ChooseNamespaces => "Select Namespaces",
            StepId::DecideSpecificResources => "Select Specific Resources?",
            StepId::ChooseResources => "Select Resources",
            StepId::EnterName => "Enter Name",
            StepId::Execute => "Running",
            StepId::Terminal => "Finished",
        }
    }

    pub fn is_multi_select(&self) -> bool {
        matches!(self, StepId::ChooseNamespaces | StepId::ChooseResources)
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { kind: OperationKind, name: String },
    DryRun { command: String },
    Failed { at: StepId },
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_identified_by_title() {
        let a = Item::new("nightly", "Completed");
        let b = Item::new("nightly", "InProgress");

        assert_eq!(a, b);
        assert_eq!(a.filter_value(), "nightly");
    }

    #[test]
    fn reported_phases() {
        assert_eq!(Phase::from_reported("Completed"), Phase::Completed);
        assert_eq!(
            Phase::from_reported("PartiallyFailed"),
            Phase::Failed("PartiallyFailed".to_string())
        );
        assert_eq!(
            Phase::from_reported("InProgress"),
            Phase::InProgress("InProgress".to_string())
        );
        assert_eq!(Phase::from_reported(""), Phase::Unknown);
        assert_eq!(Phase::from_reported("New"), Phase::InProgress("New".to_string()));
    }

    #[test]
    fn operation_round_trips_through_its_title() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_title(kind.title()), Some(kind));
        }
        assert_eq!(OperationKind::from_title("backup"), None);
        assert_eq!(OperationKind::Restore.to_string(), "restore");
    }
}
