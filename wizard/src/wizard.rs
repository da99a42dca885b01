// Wizard session: navigation model + step instances + shared context
//
// The model answers "where to next"; the wizard adds the step-level gates (valid, busy,
// allow_previous, allow_cancel) and runs the lifecycle hooks around every move.
// Finishing also requires every step on the current walk to have accepted `proceed`, since
// `jump_to_last` lands on the last step without leaving the ones in between.

use crate::navigation::{
    NavError, NavigationModel, PathGraph, Step, StepContext, StepId, StepInput, StepRegistry,
    StepView,
};
use crate::spec::WizardSpec;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of a forward request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to a new active step.
    Moved(StepId),
    /// The active step refused to be left (invalid, busy, or `proceed` returned false).
    Blocked,
    /// The last step accepted `proceed` and so did every step before it; the walk is done.
    Finished,
}

pub struct Wizard {
    model: NavigationModel,
    steps: Vec<Box<dyn Step>>,
    context: StepContext,
    /// Steps whose `proceed` accepted since they were last displayed.
    proceeded: HashSet<StepId>,
}

impl Wizard {
    pub fn new(
        graph: Arc<PathGraph>,
        registry: &StepRegistry,
        context: StepContext,
    ) -> Result<Self, NavError> {
        let steps = registry.instantiate(&graph)?;
        Ok(Self {
            model: NavigationModel::new(graph),
            steps,
            context,
            proceeded: HashSet::new(),
        })
    }

    pub fn from_spec(
        spec: &WizardSpec,
        registry: &StepRegistry,
        context: StepContext,
    ) -> Result<Self, NavError> {
        let graph = spec.compile(registry)?;
        Self::new(Arc::new(graph), registry, context)
    }

    pub fn graph(&self) -> &Arc<PathGraph> {
        self.model.graph()
    }

    pub fn model(&self) -> &NavigationModel {
        &self.model
    }

    pub fn context(&self) -> &StepContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut StepContext {
        &mut self.context
    }

    /// Reset to the first step and display it.
    pub fn start(&mut self) -> Result<StepId, NavError> {
        info!(
            "[PHASE: wizard] [STEP: start] Session {}",
            self.context.session_id()
        );
        let first = self.model.reset(&self.context.properties)?;
        self.proceeded.clear();
        self.enter(first);
        Ok(first)
    }

    pub fn active_step(&self) -> Option<StepId> {
        self.model.active_step()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_step().map(|id| self.graph().step_name(id))
    }

    pub fn active_view(&self) -> Option<StepView> {
        self.active().map(|step| step.view(&self.context))
    }

    pub fn handle_input(&mut self, input: StepInput) {
        if let Some(id) = self.active_step() {
            self.steps[id.index()].handle_input(input, &mut self.context);
        }
    }

    /// Whether Next should be enabled.
    ///
    /// Navigation errors other than reaching the end leave it enabled so that pressing Next
    /// reports them instead of hiding them behind a disabled button.
    pub fn can_next(&self) -> bool {
        let Some(step) = self.active() else {
            return false;
        };
        if !step.is_valid() || step.is_busy() {
            return false;
        }
        !matches!(self.model.peek_next(&self.context.properties), Ok(None))
    }

    pub fn can_previous(&self) -> bool {
        let Some(step) = self.active() else {
            return false;
        };
        self.model.can_go_previous() && step.allow_previous() && !step.is_busy()
    }

    pub fn can_cancel(&self) -> bool {
        self.active().map(|s| s.allow_cancel()).unwrap_or(false)
    }

    /// Next acts as Finish: the active step is the last one and may be left.
    pub fn can_finish(&self) -> bool {
        let Some(step) = self.active() else {
            return false;
        };
        step.is_valid() && !step.is_busy() && self.is_complete() && self.skipped_step().is_none()
    }

    /// First step on the current walk, other than the active one, that has not accepted
    /// `proceed` since it was last displayed.
    pub fn skipped_step(&self) -> Option<StepId> {
        let active = self.active_step()?;
        let walk = self.graph().walk_steps(&self.context.properties).ok()?;
        walk.into_iter()
            .find(|id| *id != active && !self.proceeded.contains(id))
    }

    /// Active step is the last of the walk under the current properties.
    pub fn is_complete(&self) -> bool {
        self.active_step().is_some()
            && matches!(self.model.peek_next(&self.context.properties), Ok(None))
    }

    pub fn next(&mut self) -> Result<Advance, NavError> {
        let current = self.active_step().ok_or(NavError::NotStarted)?;
        let step = &mut self.steps[current.index()];
        if !step.is_valid() || step.is_busy() {
            return Ok(Advance::Blocked);
        }
        if !step.proceed(&mut self.context) {
            info!(
                "[PHASE: wizard] [STEP: next] '{}' refused to proceed",
                step.name()
            );
            return Ok(Advance::Blocked);
        }
        self.proceeded.insert(current);
        if self.model.peek_next(&self.context.properties)?.is_none() {
            if let Some(skipped) = self.skipped_step() {
                warn!(
                    "[PHASE: wizard] [STEP: finish] Cannot finish, '{}' was never completed",
                    self.graph().step_name(skipped)
                );
                return Ok(Advance::Blocked);
            }
            info!(
                "[PHASE: wizard] [STEP: finish] Completed at '{}'",
                self.graph().step_name(current)
            );
            return Ok(Advance::Finished);
        }
        let target = self.model.next(&self.context.properties)?;
        self.enter(target);
        Ok(Advance::Moved(target))
    }

    pub fn previous(&mut self) -> Result<StepId, NavError> {
        let current = self.active().ok_or(NavError::NotStarted)?;
        if !current.allow_previous() || current.is_busy() {
            warn!(
                "[PHASE: wizard] [STEP: previous] '{}' does not allow going back",
                current.name()
            );
            return Err(NavError::PreviousBlocked(current.name().to_string()));
        }
        let target = self.model.previous()?;
        self.enter(target);
        Ok(target)
    }

    pub fn jump_to_last(&mut self) -> Result<Advance, NavError> {
        let busy = self.active().map(|s| s.is_busy()).unwrap_or(false);
        if busy {
            return Ok(Advance::Blocked);
        }
        let target = self.model.jump_to_last(&self.context.properties)?;
        self.enter(target);
        Ok(Advance::Moved(target))
    }

    /// Abort the active step; returns false when the step does not allow cancelling.
    pub fn cancel(&mut self) -> bool {
        let Some(id) = self.active_step() else {
            return false;
        };
        let step = &mut self.steps[id.index()];
        if !step.allow_cancel() {
            warn!(
                "[PHASE: wizard] [STEP: cancel] '{}' does not allow cancel",
                step.name()
            );
            return false;
        }
        step.abort(&mut self.context);
        info!("[PHASE: wizard] [STEP: cancel] Cancelled at '{}'", step.name());
        true
    }

    fn active(&self) -> Option<&dyn Step> {
        self.active_step().map(|id| self.steps[id.index()].as_ref())
    }

    fn enter(&mut self, id: StepId) {
        self.proceeded.remove(&id);
        let step = &mut self.steps[id.index()];
        step.prepare(&mut self.context);
        step.displayed(&mut self.context);
    }
}
