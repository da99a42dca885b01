// Steps: the externally supplied units of wizard work.
//
// The engine only reads a step's flags and calls its lifecycle hooks. How a step renders
// itself is up to the front-end; `StepView` is the plain-text hand-off.

use crate::navigation::condition::Properties;
use crate::navigation::error::NavError;
use crate::navigation::graph::PathGraph;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

/// Index of a step declaration in a compiled `PathGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) usize);

impl StepId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step#{}", self.0)
    }
}

/// A step as declared in the wizard spec: unique name, type name and free-form properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDecl {
    pub name: String,
    pub kind: String,
    pub properties: BTreeMap<String, String>,
}

impl StepDecl {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Boolean property; anything other than "true"/"yes"/"1" is false.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.property(key) {
            Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
            None => default,
        }
    }
}

/// Explicit context handed to every step hook (no process-wide state).
#[derive(Debug, Clone)]
pub struct StepContext {
    pub properties: Properties,
    session_id: Uuid,
}

impl StepContext {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            session_id: Uuid::new_v4(),
        }
    }

    /// Correlation id for log lines emitted during one wizard session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Default for StepContext {
    fn default() -> Self {
        Self::new(Properties::new())
    }
}

/// Front-end independent input delivered to the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInput {
    Char(char),
    Backspace,
    Up,
    Down,
}

/// Plain-text rendering of a step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepView {
    pub title: String,
    pub lines: Vec<String>,
}

pub trait Step {
    fn name(&self) -> &str;

    fn is_valid(&self) -> bool;

    fn is_busy(&self) -> bool {
        false
    }

    fn allow_previous(&self) -> bool {
        true
    }

    fn allow_cancel(&self) -> bool {
        true
    }

    /// Called before the step is displayed.
    fn prepare(&mut self, _ctx: &mut StepContext) {}

    /// Called after the step is displayed.
    fn displayed(&mut self, _ctx: &mut StepContext) {}

    /// Called before leaving forward. Returning false keeps the wizard on this step.
    fn proceed(&mut self, _ctx: &mut StepContext) -> bool {
        true
    }

    /// Called when the wizard is cancelled while this step is active.
    fn abort(&mut self, _ctx: &mut StepContext) {}

    fn handle_input(&mut self, _input: StepInput, _ctx: &mut StepContext) {}

    fn view(&self, ctx: &StepContext) -> StepView;
}

pub type StepFactory = Box<dyn Fn(&StepDecl) -> Result<Box<dyn Step>, String> + Send + Sync>;

/// Maps declared step type names to constructors.
#[derive(Default)]
pub struct StepRegistry {
    factories: HashMap<String, StepFactory>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&StepDecl) -> Result<Box<dyn Step>, String> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn create(&self, decl: &StepDecl) -> Result<Box<dyn Step>, NavError> {
        let factory = self
            .factories
            .get(&decl.kind)
            .ok_or_else(|| NavError::UnknownStepType {
                step: decl.name.clone(),
                kind: decl.kind.clone(),
            })?;
        factory(decl).map_err(|reason| NavError::StepCreation {
            step: decl.name.clone(),
            reason,
        })
    }

    /// One step instance per declaration, indexed by `StepId`.
    pub fn instantiate(&self, graph: &PathGraph) -> Result<Vec<Box<dyn Step>>, NavError> {
        graph.steps().iter().map(|decl| self.create(decl)).collect()
    }
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
