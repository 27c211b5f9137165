use std::borrow::Cow;

use crate::types::OperationKind;

/// Renders every external command line the wizard runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    pub kubectl: String,
    pub velero: String,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            velero: "velero".to_string(),
        }
    }
}

/// Parameters of `velero backup create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    pub name: String,
    /// Comma-joined, in selection order.
    pub namespaces: String,
    pub context: String,
    /// Comma-joined velero resource names; empty means everything.
    pub resources: String,
}

/// Quotes `value` as a single `sh` word. Values made only of characters the
/// shell never interprets are left as they are.
pub fn quote(value: &str) -> Cow<'_, str> {
    let plain = |c: char| c.is_ascii_alphanumeric() || "_-./:@,=+%".contains(c);
    if !value.is_empty() && value.chars().all(plain) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}

impl CommandSet {
    pub fn list_contexts(&self) -> String {
        format!("{} config get-contexts -o name", quote(&self.kubectl))
    }

    pub fn list_namespaces(&self, context: &str) -> String {
        format!(
            "{} --context {} get namespaces -o custom-columns=NAME:.metadata.name --no-headers",
            quote(&self.kubectl),
            quote(context)
        )
    }

    pub fn list_backups(&self) -> String {
        format!("{} backup get -o json", quote(&self.velero))
    }

    /// One `kubectl get all` per namespace, run in a single shell loop.
    pub fn list_resources(&self, context: &str, namespaces: &[&str]) -> String {
        let namespaces = namespaces
            .iter()
            .map(|namespace| quote(namespace))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "for ns in {namespaces}; do {} --context {} get all -n \"$ns\" --no-headers; done",
            quote(&self.kubectl),
            quote(context)
        )
    }

    pub fn create_backup(&self, request: &BackupRequest) -> String {
        let mut command = format!(
            "{} backup create {} --include-namespaces {} --kubecontext {}",
            quote(&self.velero),
            quote(&request.name),
            quote(&request.namespaces),
            quote(&request.context)
        );
        if !request.resources.is_empty() {
            command.push_str(" --include-resources ");
            command.push_str(&quote(&request.resources));
        }
        command
    }

    /// The restore takes its source backup's name so it can be described by it.
    pub fn create_restore(&self, backup: &str) -> String {
        let backup = quote(backup);
        format!(
            "{} restore create {backup} --from-backup {backup}",
            quote(&self.velero)
        )
    }

    pub fn describe(&self, kind: OperationKind, name: &str) -> String {
        format!(
            "{} {} describe {} --details -o json",
            quote(&self.velero),
            kind.as_str(),
            quote(name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_command_keeps_namespace_order() {
        let commands = CommandSet::default();
        let request = BackupRequest {
            name: "nightly".to_string(),
            namespaces: "ns2,ns1".to_string(),
            context: "prod".to_string(),
            resources: String::new(),
        };

        assert_eq!(
            commands.create_backup(&request),
            "velero backup create nightly --include-namespaces ns2,ns1 --kubecontext prod"
        );
    }

    #[test]
    fn backup_command_narrows_resources_when_given() {
        let commands = CommandSet::default();
        let request = BackupRequest {
            name: "web".to_string(),
            namespaces: "shop".to_string(),
            context: "staging".to_string(),
            resources: "pods,deployments.apps".to_string(),
        };

        assert!(commands
            .create_backup(&request)
            .ends_with("--kubecontext staging --include-resources pods,deployments.apps"));
    }

    #[test]
    fn restore_and_describe_use_configured_binary() {
        let commands = CommandSet {
            kubectl: "kubectl".to_string(),
            velero: "/opt/bin/velero".to_string(),
        };

        assert_eq!(
            commands.create_restore("nightly"),
            "/opt/bin/velero restore create nightly --from-backup nightly"
        );
        assert_eq!(
            commands.describe(OperationKind::Restore, "nightly"),
            "/opt/bin/velero restore describe nightly --details -o json"
        );
    }

    #[test]
    fn resource_listing_loops_over_namespaces() {
        let commands = CommandSet::default();
        assert_eq!(
            commands.list_resources("prod", &["ns1", "ns2"]),
            "for ns in ns1 ns2; do kubectl --context prod get all -n \"$ns\" --no-headers; done"
        );
    }

    #[test]
    fn names_with_shell_syntax_stay_one_argument() {
        let commands = CommandSet::default();
        let request = BackupRequest {
            name: "x; touch /tmp/owned; echo".to_string(),
            namespaces: "ns1".to_string(),
            context: "prod".to_string(),
            resources: String::new(),
        };

        assert_eq!(
            commands.create_backup(&request),
            "velero backup create 'x; touch /tmp/owned; echo' --include-namespaces ns1 --kubecontext prod"
        );
        assert_eq!(
            commands.describe(OperationKind::Backup, "my backup"),
            "velero backup describe 'my backup' --details -o json"
        );
    }

    #[test]
    fn quoting_escapes_single_quotes_and_empty_values() {
        assert_eq!(quote("nightly-2024.05"), "nightly-2024.05");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote("$HOME"), "'$HOME'");
        assert_eq!(
            CommandSet::default().list_resources("kind cluster", &["a b", "c"]),
            "for ns in 'a b' c; do kubectl --context 'kind cluster' get all -n \"$ns\" --no-headers; done"
        );
    }
}
