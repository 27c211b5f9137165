use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, WizardError};
use crate::shell::CommandExecutor;
use crate::types::Item;

/// Resource kinds offered for per-resource selection, as `kubectl get all`
/// prints them, paired with the name velero's `--include-resources` expects.
pub const RESOURCE_KINDS: &[(&str, &str)] = &[
    ("pod", "pods"),
    ("service", "services"),
    ("deployment.apps", "deployments.apps"),
    ("replicaset.apps", "replicasets.apps"),
    ("statefulset.apps", "statefulsets.apps"),
    ("daemonset.apps", "daemonsets.apps"),
    ("job.batch", "jobs.batch"),
    ("cronjob.batch", "cronjobs.batch"),
];

fn resource_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let kinds = RESOURCE_KINDS
            .iter()
            .map(|(kind, _)| regex::escape(kind))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"^(?:{kinds})/\S+")).expect("resource pattern is valid")
    })
}

/// Velero resource name for a `type/name` title, if the type is allowlisted.
pub fn velero_resource(title: &str) -> Option<&'static str> {
    let (kind, _) = title.split_once('/')?;
    RESOURCE_KINDS
        .iter()
        .find(|(known, _)| *known == kind)
        .map(|(_, resource)| *resource)
}

/// One item per line, taken as printed. Surrounding newlines are dropped and
/// blank output gives no items at all.
pub fn parse_lines(output: &str) -> Vec<Item> {
    let body = output.trim_matches(['\n', '\r']);
    if body.trim().is_empty() {
        return Vec::new();
    }
    body.lines().map(Item::titled).collect()
}

/// `type/name` tokens at line start for allowlisted types, first occurrence
/// wins. Other lines are skipped.
pub fn parse_resources(output: &str) -> Vec<Item> {
    let pattern = resource_pattern();
    let mut seen = HashSet::new();
    output
        .lines()
        .filter_map(|line| pattern.find(line))
        .map(|found| found.as_str())
        .filter(|resource| seen.insert(*resource))
        .map(Item::titled)
        .collect()
}

#[derive(Debug, Deserialize)]
struct BackupMetadata {
    name: String,
    #[serde(rename = "creationTimestamp")]
    creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct BackupStatus {
    phase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackupEntry {
    metadata: BackupMetadata,
    #[serde(default)]
    status: Option<BackupStatus>,
}

/// `velero backup get -o json` prints a bare object for a single backup and a
/// `List` for several; older tooling printed a plain array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackupListing {
    Array(Vec<BackupEntry>),
    List { items: Vec<BackupEntry> },
    Single(BackupEntry),
}

impl BackupEntry {
    fn into_item(self) -> Item {
        let phase = self.status.and_then(|status| status.phase);
        let created = self
            .metadata
            .creation_timestamp
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string());
        let description = match (phase, created) {
            (Some(phase), Some(created)) => format!("{phase} · {created}"),
            (Some(phase), None) => phase,
            (None, Some(created)) => created,
            (None, None) => String::new(),
        };
        Item::new(self.metadata.name, description)
    }
}

pub fn parse_backups(output: &str) -> std::result::Result<Vec<Item>, serde_json::Error> {
    let entries = match serde_json::from_str::<BackupListing>(output)? {
        BackupListing::Array(entries) | BackupListing::List { items: entries } => entries,
        BackupListing::Single(entry) => vec![entry],
    };
    Ok(entries.into_iter().map(BackupEntry::into_item).collect())
}

/// Runs `command` and maps its lines to items.
pub async fn fetch_lines(
    executor: &dyn CommandExecutor,
    what: &'static str,
    command: &str,
) -> Result<Vec<Item>> {
    let output = executor
        .execute(command)
        .await
        .map_err(|source| WizardError::Fetch { what, source })?;
    Ok(parse_lines(&output))
}

/// Runs the backup listing and decodes it.
pub async fn fetch_backups(executor: &dyn CommandExecutor, command: &str) -> Result<Vec<Item>> {
    let output = executor
        .execute(command)
        .await
        .map_err(|source| WizardError::Fetch {
            what: "backups",
            source,
        })?;
    parse_backups(&output).map_err(|source| WizardError::Parse {
        what: "backups",
        source,
    })
}

/// Runs the resource listing and keeps allowlisted resources.
pub async fn fetch_resources(executor: &dyn CommandExecutor, command: &str) -> Result<Vec<Item>> {
    let output = executor
        .execute(command)
        .await
        .map_err(|source| WizardError::Fetch {
            what: "resources",
            source,
        })?;
    Ok(parse_resources(&output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use crate::shell::MockCommandExecutor;

    fn titles(items: &[Item]) -> Vec<&str> {
        items.iter().map(Item::title).collect()
    }

    #[test]
    fn lines_map_one_item_each() {
        let items = parse_lines("a\nb\nc\n");
        assert_eq!(titles(&items), vec!["a", "b", "c"]);
        assert!(items.iter().all(|item| item.description().is_empty()));
    }

    #[test]
    fn lines_are_kept_verbatim() {
        let items = parse_lines("\nctx one \n\n  ctx-two\r\n");
        assert_eq!(titles(&items), vec!["ctx one ", "", "  ctx-two"]);
    }

    #[test]
    fn blank_output_gives_no_items() {
        assert!(parse_lines("").is_empty());
        assert!(parse_lines("  \n\n").is_empty());
    }

    #[test]
    fn resources_are_allowlisted_and_deduplicated() {
        let output = "\
NAME                 READY   STATUS    RESTARTS   AGE
pod/foo  Running
service/bar  ClusterIP
horizontalpodautoscaler.autoscaling/web   Deployment/web
pod/foo  Running
";
        let items = parse_resources(output);
        assert_eq!(titles(&items), vec!["pod/foo", "service/bar"]);
    }

    #[test]
    fn resources_only_match_at_line_start() {
        let output = "  pod/indented Running\nnote: pod/inline\ndeployment.apps/web   1/1";
        assert_eq!(titles(&parse_resources(output)), vec!["deployment.apps/web"]);
    }

    #[test]
    fn velero_resource_names() {
        assert_eq!(velero_resource("pod/foo"), Some("pods"));
        assert_eq!(velero_resource("replicaset.apps/web-5d8"), Some("replicasets.apps"));
        assert_eq!(velero_resource("configmap/settings"), None);
        assert_eq!(velero_resource("nonsense"), None);
    }

    #[test]
    fn backups_from_list_object() {
        let output = r#"{
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {"metadata": {"name": "nightly", "creationTimestamp": "2024-05-01T02:00:00Z"},
                 "status": {"phase": "Completed"}},
                {"metadata": {"name": "weekly"}}
            ]
        }"#;

        let items = parse_backups(output).unwrap();
        assert_eq!(titles(&items), vec!["nightly", "weekly"]);
        assert_eq!(items[0].description(), "Completed · 2024-05-01 02:00 UTC");
        assert_eq!(items[1].description(), "");
    }

    #[test]
    fn backups_from_array_and_single_object() {
        let array = r#"[{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}]"#;
        assert_eq!(titles(&parse_backups(array).unwrap()), vec!["a", "b"]);

        let single = r#"{"metadata": {"name": "only"}, "status": {"phase": "InProgress"}}"#;
        let items = parse_backups(single).unwrap();
        assert_eq!(titles(&items), vec!["only"]);
        assert_eq!(items[0].description(), "InProgress");
    }

    #[test]
    fn malformed_backups_fail_to_parse() {
        assert!(parse_backups("An error occurred: no backups").is_err());
    }

    #[tokio::test]
    async fn fetch_lines_propagates_command_failure() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_execute().times(1).returning(|command| {
            Err(CommandError::Exit {
                command: command.to_string(),
                status: "exit status: 1".to_string(),
                output: "error: no configuration".to_string(),
            })
        });

        let err = fetch_lines(&executor, "contexts", "kubectl config get-contexts -o name")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Fetch { what: "contexts", .. }));
    }

    #[tokio::test]
    async fn fetch_backups_distinguishes_parse_failure() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_execute()
            .withf(|command: &str| command == "velero backup get -o json")
            .times(1)
            .returning(|_| Ok("not json".to_string()));

        let err = fetch_backups(&executor, "velero backup get -o json")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::Parse { what: "backups", .. }));
    }
}
