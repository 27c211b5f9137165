use tokio::sync::watch;
use tracing::{debug, info, warn, Span};

use crate::config::Settings;
use crate::error::WizardError;
use crate::poller::CompletionPoller;
use crate::selection::{ItemList, MultiSelect, SelectionSet};
use crate::shell::CommandExecutor;
use crate::sources;
use crate::state::step::YES;
use crate::state::{Choices, Step};
use crate::types::{Item, OperationKind, Outcome, StepId};

/// The wizard session: the active step, what has been confirmed so far and
/// the last error.
pub struct App {
    pub step: Step,
    pub choices: Choices,
    pub last_error: Option<WizardError>,
    pub show_help: bool,
    pub settings: Settings,
    executor: Box<dyn CommandExecutor>,
    span: Span,
}

impl App {
    pub fn new(executor: Box<dyn CommandExecutor>, settings: Settings, span: Span) -> Self {
        Self {
            step: Step::operations(),
            choices: Choices::default(),
            last_error: None,
            show_help: false,
            settings,
            executor,
            span,
        }
    }

    pub fn step_id(&self) -> StepId {
        self.step.id()
    }

    /// Rows of the active step; empty for the name, execute and final steps.
    pub fn items(&self) -> &[Item] {
        self.step.list().map(ItemList::items).unwrap_or_default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.step.list().map(ItemList::cursor)
    }

    /// Selection being built on a multi-select step.
    pub fn selection(&self) -> Option<&SelectionSet> {
        self.step.selection()
    }

    pub fn name_buffer(&self) -> Option<&str> {
        match &self.step {
            Step::EnterName(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.step {
            Step::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.step, Step::Terminal(_))
    }

    pub fn move_selection_up(&mut self) {
        if let Some(list) = self.step.list_mut() {
            list.move_up();
        }
    }

    pub fn move_selection_down(&mut self) {
        if let Some(list) = self.step.list_mut() {
            list.move_down();
        }
    }

    /// Space on a multi-select step.
    pub fn toggle_current(&mut self) {
        if let Some(multi) = self.step.multi_mut() {
            let title = multi.list.current().map(|item| item.title().to_string());
            let selected = multi.toggle_current();
            if let Some(title) = title {
                debug!(parent: &self.span, item = %title, selected, "toggled item");
            }
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Step::EnterName(buffer) = &mut self.step {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Step::EnterName(buffer) = &mut self.step {
            buffer.pop();
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Ends the session from any step, dropping everything chosen so far.
    pub fn quit(&mut self) {
        info!(parent: &self.span, step = ?self.step_id(), "session quit by user");
        self.choices = Choices::default();
        self.last_error = None;
        self.step = Step::Terminal(Outcome::Quit);
    }

    /// Enter on the active step.
    pub async fn confirm(&mut self) {
        let step = std::mem::replace(&mut self.step, Step::Execute);
        let at = step.id();
        self.step = match self.advance(step).await {
            Ok(next) => {
                if next.id() != at {
                    self.last_error = None;
                }
                next
            }
            Err(Rejected::Retry(step, err)) => {
                warn!(parent: &self.span, step = ?at, error = %err, "selection rejected");
                self.last_error = Some(err);
                step
            }
            Err(Rejected::Fatal(err)) => self.fail(at, err),
        };
    }

    async fn advance(&mut self, step: Step) -> Result<Step, Rejected> {
        match step {
            Step::ChooseOperation(list) => {
                let Some(kind) = list.current().and_then(|item| OperationKind::from_title(item.title())) else {
                    return Err(Rejected::Retry(
                        Step::ChooseOperation(list),
                        WizardError::NothingToSelect("operation"),
                    ));
                };
                info!(parent: &self.span, operation = %kind, "selected operation");
                self.choices.set_operation(kind);
                match kind {
                    OperationKind::Backup => self.load_contexts().await,
                    OperationKind::Restore => {
                        let command = self.settings.commands.list_backups();
                        let backups = sources::fetch_backups(self.executor.as_ref(), &command)
                            .await
                            .map_err(Rejected::Fatal)?;
                        Ok(Step::ChooseExistingBackup(ItemList::new(backups)))
                    }
                }
            }
            Step::ChooseExistingBackup(list) => {
                let Some(backup) = list.current().cloned() else {
                    return Err(Rejected::Retry(
                        Step::ChooseExistingBackup(list),
                        WizardError::NothingToSelect("backup"),
                    ));
                };
                info!(parent: &self.span, backup = backup.title(), "selected backup");
                self.choices.set_backup(backup);
                self.load_contexts().await
            }
            Step::ChooseContext(list) => {
                let Some(context) = list.current().cloned() else {
                    return Err(Rejected::Retry(
                        Step::ChooseContext(list),
                        WizardError::NothingToSelect("context"),
                    ));
                };
                info!(parent: &self.span, context = context.title(), "selected context");
                let command = self.settings.commands.list_namespaces(context.title());
                self.choices.set_context(context);
                let namespaces = sources::fetch_lines(self.executor.as_ref(), "namespaces", &command)
                    .await
                    .map_err(Rejected::Fatal)?;
                Ok(Step::ChooseNamespaces(MultiSelect::new(namespaces)))
            }
            Step::ChooseNamespaces(multi) => {
                if multi.selected.is_empty() {
                    return Err(Rejected::Retry(
                        Step::ChooseNamespaces(multi),
                        WizardError::EmptySelection("namespace"),
                    ));
                }
                info!(parent: &self.span, namespaces = ?multi.selected.titles(), "selected namespaces");
                self.choices.set_namespaces(multi.selected.into_items());
                if self.settings.resource_selection
                    && self.choices.operation() == Some(OperationKind::Backup)
                {
                    Ok(Step::resource_decision())
                } else {
                    Ok(Step::EnterName(String::new()))
                }
            }
            Step::DecideSpecificResources(list) => {
                let Some(wants_resources) = list.current().map(|answer| answer.title() == YES) else {
                    return Err(Rejected::Retry(
                        Step::DecideSpecificResources(list),
                        WizardError::NothingToSelect("answer"),
                    ));
                };
                if !wants_resources {
                    return Ok(Step::EnterName(String::new()));
                }
                let context = self
                    .choices
                    .context()
                    .map(|context| context.title().to_string())
                    .unwrap_or_default();
                let namespaces: Vec<&str> =
                    self.choices.namespaces().iter().map(Item::title).collect();
                let command = self.settings.commands.list_resources(&context, &namespaces);
                let resources = sources::fetch_resources(self.executor.as_ref(), &command)
                    .await
                    .map_err(Rejected::Fatal)?;
                Ok(Step::ChooseResources(MultiSelect::new(resources)))
            }
            Step::ChooseResources(multi) => {
                if multi.selected.is_empty() {
                    return Err(Rejected::Retry(
                        Step::ChooseResources(multi),
                        WizardError::EmptySelection("resource"),
                    ));
                }
                info!(parent: &self.span, resources = ?multi.selected.titles(), "selected resources");
                self.choices.set_resources(multi.selected.into_items());
                Ok(Step::EnterName(String::new()))
            }
            Step::EnterName(name) => {
                info!(parent: &self.span, name = %name, "entered name");
                self.choices.set_name(name);
                Ok(Step::Execute)
            }
            step @ (Step::Execute | Step::Terminal(_)) => Ok(step),
        }
    }

    async fn load_contexts(&self) -> Result<Step, Rejected> {
        let command = self.settings.commands.list_contexts();
        let contexts = sources::fetch_lines(self.executor.as_ref(), "contexts", &command)
            .await
            .map_err(Rejected::Fatal)?;
        Ok(Step::ChooseContext(ItemList::new(contexts)))
    }

    /// Dispatches the operation and waits for velero to report it finished.
    /// Does nothing unless the session is on the execute step.
    pub async fn execute(&mut self, mut cancel: watch::Receiver<bool>) {
        if !matches!(self.step, Step::Execute) {
            return;
        }
        let Some(record) = self.choices.record() else {
            warn!(parent: &self.span, "execute reached without a complete record");
            self.step = Step::Terminal(Outcome::Failed { at: StepId::Execute });
            return;
        };

        let command = record.dispatch_command(&self.settings.commands);
        if self.settings.dry_run {
            info!(parent: &self.span, command = %command, "dry run, not dispatching");
            self.step = Step::Terminal(Outcome::DryRun { command });
            return;
        }

        info!(parent: &self.span, command = %command, "dispatching operation");
        if let Err(err) = self.executor.execute(&command).await {
            debug!(parent: &self.span, output = %err.output(), "dispatch output");
            self.step = self.fail(StepId::Execute, WizardError::Dispatch(err));
            return;
        }

        let result = {
            let poller = CompletionPoller::new(
                self.executor.as_ref(),
                &self.settings.commands,
                self.settings.poll_interval,
                self.span.clone(),
            );
            poller
                .await_completion(record.kind, record.poll_name(), &mut cancel)
                .await
        };

        self.step = match result {
            Ok(()) => {
                info!(parent: &self.span, "operation completed successfully");
                Step::Terminal(Outcome::Completed {
                    kind: record.kind,
                    name: record.poll_name().to_string(),
                })
            }
            Err(err) => self.fail(StepId::Execute, err),
        };
    }

    fn fail(&mut self, at: StepId, err: WizardError) -> Step {
        warn!(parent: &self.span, step = ?at, error = %err, "session ended with error");
        self.last_error = Some(err);
        Step::Terminal(Outcome::Failed { at })
    }
}

enum Rejected {
    /// Stay on the step; the user can fix the selection.
    Retry(Step, WizardError),
    Fatal(WizardError),
}
