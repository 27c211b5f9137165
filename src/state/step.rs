use crate::selection::{ItemList, MultiSelect, SelectionSet};
use crate::types::{Item, OperationKind, Outcome, StepId};

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// The active step, carrying only the working data that step needs.
#[derive(Debug, Clone)]
pub enum Step {
    ChooseOperation(ItemList),
    ChooseExistingBackup(ItemList),
    ChooseContext(ItemList),
    ChooseNamespaces(MultiSelect),
    DecideSpecificResources(ItemList),
    ChooseResources(MultiSelect),
    EnterName(String),
    Execute,
    Terminal(Outcome),
}

impl Step {
    pub fn operations() -> Self {
        Step::ChooseOperation(ItemList::new(
            OperationKind::ALL.iter().map(OperationKind::item).collect(),
        ))
    }

    pub fn resource_decision() -> Self {
        Step::DecideSpecificResources(ItemList::new(vec![
            Item::new(NO, "Back up everything in the chosen namespaces"),
            Item::new(YES, "Pick individual resources"),
        ]))
    }

    pub fn id(&self) -> StepId {
        match self {
            Step::ChooseOperation(_) => StepId::ChooseOperation,
            Step::ChooseExistingBackup(_) => StepId::ChooseExistingBackup,
            Step::ChooseContext(_) => StepId::ChooseContext,
            Step::ChooseNamespaces(_) => StepId::ChooseNamespaces,
            Step::DecideSpecificResources(_) => StepId::DecideSpecificResources,
            Step::ChooseResources(_) => StepId::ChooseResources,
            Step::EnterName(_) => StepId::EnterName,
            Step::Execute => StepId::Execute,
            Step::Terminal(_) => StepId::Terminal,
        }
    }

    pub fn list(&self) -> Option<&ItemList> {
        match self {
            Step::ChooseOperation(list)
            | Step::ChooseExistingBackup(list)
            | Step::ChooseContext(list)
            | Step::DecideSpecificResources(list) => Some(list),
            Step::ChooseNamespaces(multi) | Step::ChooseResources(multi) => Some(&multi.list),
            _ => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut ItemList> {
        match self {
            Step::ChooseOperation(list)
            | Step::ChooseExistingBackup(list)
            | Step::ChooseContext(list)
            | Step::DecideSpecificResources(list) => Some(list),
            Step::ChooseNamespaces(multi) | Step::ChooseResources(multi) => {
                Some(&mut multi.list)
            }
            _ => None,
        }
    }

    pub fn multi_mut(&mut self) -> Option<&mut MultiSelect> {
        match self {
            Step::ChooseNamespaces(multi) | Step::ChooseResources(multi) => Some(multi),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&SelectionSet> {
        match self {
            Step::ChooseNamespaces(multi) | Step::ChooseResources(multi) => Some(&multi.selected),
            _ => None,
        }
    }
}
