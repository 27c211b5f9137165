use crate::commands::{BackupRequest, CommandSet};
use crate::sources::velero_resource;
use crate::types::{Item, OperationKind};

/// Values confirmed so far. Each slot is written once, when its step is
/// confirmed, and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Choices {
    operation: Option<OperationKind>,
    backup: Option<Item>,
    context: Option<Item>,
    namespaces: Vec<Item>,
    resources: Vec<Item>,
    name: Option<String>,
}

impl Choices {
    pub fn operation(&self) -> Option<OperationKind> {
        self.operation
    }

    pub fn backup(&self) -> Option<&Item> {
        self.backup.as_ref()
    }

    pub fn context(&self) -> Option<&Item> {
        self.context.as_ref()
    }

    pub fn namespaces(&self) -> &[Item] {
        &self.namespaces
    }

    pub fn resources(&self) -> &[Item] {
        &self.resources
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_operation(&mut self, kind: OperationKind) {
        self.operation.get_or_insert(kind);
    }

    pub(crate) fn set_backup(&mut self, backup: Item) {
        self.backup.get_or_insert(backup);
    }

    pub(crate) fn set_context(&mut self, context: Item) {
        self.context.get_or_insert(context);
    }

    pub(crate) fn set_namespaces(&mut self, namespaces: Vec<Item>) {
        if self.namespaces.is_empty() {
            self.namespaces = namespaces;
        }
    }

    pub(crate) fn set_resources(&mut self, resources: Vec<Item>) {
        if self.resources.is_empty() {
            self.resources = resources;
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name.get_or_insert(name);
    }

    /// `None` until every slot the chosen operation needs is filled.
    pub fn record(&self) -> Option<OperationRecord> {
        let kind = self.operation?;
        let target = match kind {
            OperationKind::Backup => Target::Namespaces {
                namespaces: self.namespaces.iter().map(|ns| ns.title().to_string()).collect(),
                resources: self.resources.iter().map(|r| r.title().to_string()).collect(),
            },
            OperationKind::Restore => Target::Backup(self.backup.as_ref()?.title().to_string()),
        };
        Some(OperationRecord {
            kind,
            context: self.context.as_ref()?.title().to_string(),
            target,
            name: self.name.clone()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Namespaces {
        namespaces: Vec<String>,
        resources: Vec<String>,
    },
    Backup(String),
}

/// Everything needed to dispatch and then poll one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub context: String,
    pub target: Target,
    pub name: String,
}

impl OperationRecord {
    pub fn backup_request(&self) -> Option<BackupRequest> {
        match &self.target {
            Target::Namespaces {
                namespaces,
                resources,
            } => Some(self.request_for(namespaces, resources)),
            Target::Backup(_) => None,
        }
    }

    fn request_for(&self, namespaces: &[String], resources: &[String]) -> BackupRequest {
        let mut kinds: Vec<&str> = Vec::new();
        for resource in resources.iter().filter_map(|r| velero_resource(r)) {
            if !kinds.contains(&resource) {
                kinds.push(resource);
            }
        }

        BackupRequest {
            name: self.name.clone(),
            namespaces: namespaces.join(","),
            context: self.context.clone(),
            resources: kinds.join(","),
        }
    }

    pub fn dispatch_command(&self, commands: &CommandSet) -> String {
        match &self.target {
            Target::Namespaces {
                namespaces,
                resources,
            } => commands.create_backup(&self.request_for(namespaces, resources)),
            Target::Backup(backup) => commands.create_restore(backup),
        }
    }

    /// Name the status query is made with: the entered name for a backup, the
    /// source backup for a restore.
    pub fn poll_name(&self) -> &str {
        match &self.target {
            Target::Namespaces { .. } => &self.name,
            Target::Backup(backup) => backup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup_choices() -> Choices {
        let mut choices = Choices::default();
        choices.set_operation(OperationKind::Backup);
        choices.set_context(Item::titled("prod"));
        choices.set_namespaces(vec![Item::titled("ns1"), Item::titled("ns2")]);
        choices.set_name("nightly".to_string());
        choices
    }

    #[test]
    fn backup_record_parameters() {
        let record = backup_choices().record().unwrap();
        let request = record.backup_request().unwrap();

        assert_eq!(request.name, "nightly");
        assert_eq!(request.namespaces, "ns1,ns2");
        assert_eq!(request.context, "prod");
        assert!(request.resources.is_empty());
        assert_eq!(record.poll_name(), "nightly");
    }

    #[test]
    fn resources_collapse_to_velero_types() {
        let mut choices = backup_choices();
        choices.set_resources(vec![
            Item::titled("pod/api-0"),
            Item::titled("deployment.apps/api"),
            Item::titled("pod/api-1"),
        ]);

        let request = choices.record().unwrap().backup_request().unwrap();
        assert_eq!(request.resources, "pods,deployments.apps");
    }

    #[test]
    fn restore_record_polls_the_backup() {
        let mut choices = Choices::default();
        choices.set_operation(OperationKind::Restore);
        choices.set_backup(Item::titled("nightly-2024"));
        choices.set_context(Item::titled("dr"));
        choices.set_namespaces(vec![Item::titled("shop")]);
        choices.set_name(String::new());

        let record = choices.record().unwrap();
        assert_eq!(record.poll_name(), "nightly-2024");
        assert!(record.backup_request().is_none());
        assert_eq!(
            record.dispatch_command(&CommandSet::default()),
            "velero restore create nightly-2024 --from-backup nightly-2024"
        );
    }

    #[test]
    fn confirmed_slots_are_not_overwritten() {
        let mut choices = backup_choices();
        choices.set_context(Item::titled("staging"));
        choices.set_name("other".to_string());
        choices.set_namespaces(vec![Item::titled("ns3")]);

        assert_eq!(choices.context().map(Item::title), Some("prod"));
        assert_eq!(choices.name(), Some("nightly"));
        let namespaces: Vec<&str> = choices.namespaces().iter().map(Item::title).collect();
        assert_eq!(namespaces, vec!["ns1", "ns2"]);
    }

    #[test]
    fn record_needs_every_slot() {
        let mut choices = Choices::default();
        choices.set_operation(OperationKind::Backup);
        choices.set_context(Item::titled("prod"));
        assert!(choices.record().is_none());
    }
}
