//! Linear setup wizard.
//!
//! Navigation is a reducer over [`WizardState`]; [`render`] turns a state and
//! a [`Catalog`] into a [`StepView`] without side effects. Step actions are
//! tags resolved against the catalog's bindings when a step is rendered.

pub mod actions;
pub mod catalog;
pub mod terminal;

use self::actions::ActionBinding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Step {
    pub fn new(title: impl Into<String>, body: impl Into<String>, actions: &[&str]) -> Self {
        Step {
            title: title.into(),
            body: body.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Position in the step sequence, always within `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardState {
    current: usize,
    total: usize,
    finished: bool,
}

impl WizardState {
    /// `None` for an empty sequence.
    pub fn new(total: usize) -> Option<Self> {
        (total > 0).then_some(WizardState {
            current: 1,
            total,
            finished: false,
        })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Back,
}

/// Next on the last step finishes the wizard instead of moving.
pub fn reduce(state: WizardState, action: Action) -> WizardState {
    match action {
        Action::Next if state.is_last() => WizardState {
            finished: true,
            ..state
        },
        Action::Next => WizardState {
            current: state.current + 1,
            ..state
        },
        Action::Back => WizardState {
            current: state.current.saturating_sub(1).max(1),
            ..state
        },
    }
}

pub struct Catalog {
    pub steps: Vec<Step>,
    pub bindings: BTreeMap<String, ActionBinding>,
}

impl Catalog {
    pub fn new(steps: Vec<Step>, bindings: BTreeMap<String, ActionBinding>) -> Self {
        Catalog { steps, bindings }
    }

    pub fn start(&self) -> Option<WizardState> {
        WizardState::new(self.steps.len())
    }
}

#[derive(Debug, PartialEq)]
pub struct StepView<'a> {
    pub header: String,
    pub title: &'a str,
    pub body: &'a str,
    pub actions: Vec<(&'a str, &'a ActionBinding)>,
    pub next_label: &'static str,
    pub can_go_back: bool,
}

pub fn render<'a>(state: &WizardState, catalog: &'a Catalog) -> StepView<'a> {
    let step = &catalog.steps[state.current - 1];

    let actions = step
        .actions
        .iter()
        .filter_map(|tag| match catalog.bindings.get(tag) {
            Some(binding) => Some((tag.as_str(), binding)),
            None => {
                log::warn!("Step '{}' refers to unknown action '{}'", step.title, tag);
                None
            }
        })
        .collect();

    StepView {
        header: format!("Step {} of {}", state.current, state.total),
        title: &step.title,
        body: &step.body,
        actions,
        next_label: if state.is_last() { "Finish" } else { "Next" },
        can_go_back: state.current > 1,
    }
}
