use std::time::Duration;

use clap::{Arg, ArgMatches, Command};

use crate::commands::CommandSet;
use crate::poller::DEFAULT_POLL_INTERVAL;

/// A restore is created under its source backup's name so its status can be
/// looked up by that name.
pub const RESTORE_NAME_NOTE: &str = "Restores are named after the backup they restore from, \
so a backup can only be restored again once the earlier restore is deleted \
(velero restore delete <backup>).";

/// Runtime configuration of the wizard.
#[derive(Debug, Clone)]
pub struct Settings {
    pub commands: CommandSet,
    pub poll_interval: Duration,
    /// Render the dispatch command instead of running it.
    pub dry_run: bool,
    /// Offer the per-resource step after namespaces for backups.
    pub resource_selection: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commands: CommandSet::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            dry_run: false,
            resource_selection: true,
            debug: false,
        }
    }
}

pub fn cli() -> Command {
    Command::new("velero-wizard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interactive Velero backup and restore wizard")
        .after_help(RESTORE_NAME_NOTE)
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging (printed after the wizard exits)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Show the backup/restore command instead of running it")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("velero")
                .long("velero")
                .value_name("BIN")
                .default_value("velero")
                .help("Velero executable"),
        )
        .arg(
            Arg::new("kubectl")
                .long("kubectl")
                .value_name("BIN")
                .default_value("kubectl")
                .help("kubectl executable"),
        )
        .arg(
            Arg::new("poll-interval")
                .long("poll-interval")
                .value_name("SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Seconds between status checks while waiting for completion"),
        )
        .arg(
            Arg::new("no-resource-selection")
                .long("no-resource-selection")
                .help("Skip the step offering to back up individual resources")
                .action(clap::ArgAction::SetTrue),
        )
}

impl Settings {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let defaults = CommandSet::default();
        Self {
            commands: CommandSet {
                kubectl: matches
                    .get_one::<String>("kubectl")
                    .cloned()
                    .unwrap_or(defaults.kubectl),
                velero: matches
                    .get_one::<String>("velero")
                    .cloned()
                    .unwrap_or(defaults.velero),
            },
            poll_interval: matches
                .get_one::<u64>("poll-interval")
                .map(|secs| Duration::from_secs(*secs))
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            dry_run: matches.get_flag("dry-run"),
            resource_selection: !matches.get_flag("no-resource-selection"),
            debug: matches.get_flag("debug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_velero_conventions() {
        let matches = cli().try_get_matches_from(["velero-wizard"]).unwrap();
        let settings = Settings::from_matches(&matches);

        assert_eq!(settings.commands, CommandSet::default());
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert!(settings.resource_selection);
        assert!(!settings.dry_run);
        assert!(!settings.debug);
    }

    #[test]
    fn flags_override_defaults() {
        let matches = cli()
            .try_get_matches_from([
                "velero-wizard",
                "--debug",
                "--dry-run",
                "--velero",
                "/usr/local/bin/velero",
                "--poll-interval",
                "30",
                "--no-resource-selection",
            ])
            .unwrap();
        let settings = Settings::from_matches(&matches);

        assert_eq!(settings.commands.velero, "/usr/local/bin/velero");
        assert_eq!(settings.commands.kubectl, "kubectl");
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
        assert!(!settings.resource_selection);
        assert!(settings.dry_run);
        assert!(settings.debug);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["velero-wizard", "--poll-interval", "0"])
            .is_err());
    }

    #[test]
    fn help_explains_restore_naming() {
        let help = cli().render_long_help().to_string();
        assert!(help.contains("Restores are named after the backup they restore from"));
    }
}
