// Stateful walk over a compiled `PathGraph`.
//
// The model tracks one active step and a history stack. `reset` seeds the history with the first
// step, every forward move pushes the step being left, and `previous` pops it back. The seed
// entry is never popped, so `previous` on the first step is an underflow.

use crate::navigation::condition::Properties;
use crate::navigation::error::NavError;
use crate::navigation::graph::{Landing, PathGraph};
use crate::navigation::segment::SegmentId;
use crate::navigation::step::StepId;
use log::info;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NavigationModel {
    graph: Arc<PathGraph>,
    active: Option<StepId>,
    first: Option<StepId>,
    history: Vec<StepId>,
}

impl NavigationModel {
    pub fn new(graph: Arc<PathGraph>) -> Self {
        Self {
            graph,
            active: None,
            first: None,
            history: Vec::new(),
        }
    }

    pub fn graph(&self) -> &Arc<PathGraph> {
        &self.graph
    }

    pub fn active_step(&self) -> Option<StepId> {
        self.active
    }

    pub fn active_segment(&self) -> Option<SegmentId> {
        self.active.map(|s| self.graph.segment_of(s))
    }

    pub fn history(&self) -> &[StepId] {
        &self.history
    }

    pub fn segment_of(&self, step: StepId) -> SegmentId {
        self.graph.segment_of(step)
    }

    /// Clear history and move to the root's first step.
    pub fn reset(&mut self, properties: &Properties) -> Result<StepId, NavError> {
        self.history.clear();
        self.active = None;
        self.first = None;

        let root = self.graph.root();
        let first = match self.graph.settle(root, properties)? {
            Landing::Step(step) => step,
            Landing::End { .. } => {
                return Err(NavError::NoReachableStep(
                    self.graph.segment(root).name().to_string(),
                ))
            }
        };

        self.active = Some(first);
        self.first = Some(first);
        self.history.push(first);
        info!(
            "[PHASE: navigation] [STEP: reset] Active step '{}'",
            self.graph.step_name(first)
        );
        Ok(first)
    }

    /// Step that `next` would move to; `Ok(None)` on the last step of the walk.
    pub fn peek_next(&self, properties: &Properties) -> Result<Option<StepId>, NavError> {
        let current = self.active.ok_or(NavError::NotStarted)?;
        match self.resolve_next(current, properties) {
            Ok(step) => Ok(Some(step)),
            Err(NavError::AtLastStep(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn next(&mut self, properties: &Properties) -> Result<StepId, NavError> {
        let current = self.active.ok_or(NavError::NotStarted)?;
        let target = self.resolve_next(current, properties)?;
        self.history.push(current);
        self.active = Some(target);
        info!(
            "[PHASE: navigation] [STEP: next] '{}' -> '{}'",
            self.graph.step_name(current),
            self.graph.step_name(target)
        );
        Ok(target)
    }

    pub fn previous(&mut self) -> Result<StepId, NavError> {
        let current = self.active.ok_or(NavError::NotStarted)?;
        if !self.can_go_previous() {
            return Err(NavError::HistoryUnderflow);
        }
        let target = self.history.pop().ok_or(NavError::HistoryUnderflow)?;
        self.active = Some(target);
        info!(
            "[PHASE: navigation] [STEP: previous] '{}' -> '{}'",
            self.graph.step_name(current),
            self.graph.step_name(target)
        );
        Ok(target)
    }

    /// Move straight to the last step of the walk from the root.
    pub fn jump_to_last(&mut self, properties: &Properties) -> Result<StepId, NavError> {
        let current = self.active.ok_or(NavError::NotStarted)?;
        let target = self.graph.last_step(properties)?;
        self.history.push(current);
        self.active = Some(target);
        info!(
            "[PHASE: navigation] [STEP: jump] '{}' -> '{}'",
            self.graph.step_name(current),
            self.graph.step_name(target)
        );
        Ok(target)
    }

    pub fn can_go_previous(&self) -> bool {
        self.history.len() > 1
    }

    /// True only for the first step reached from the root.
    pub fn is_first_step(&self, step: StepId) -> bool {
        self.first == Some(step)
    }

    /// Completion is decided above the model; this never reports the last step as visible.
    pub fn is_last_visible(&self) -> bool {
        false
    }

    fn resolve_next(&self, current: StepId, properties: &Properties) -> Result<StepId, NavError> {
        let segment = self.graph.owning_segment(current)?;
        if !segment.is_last(current) {
            return segment.step_after(current);
        }
        let Some(successor) = segment.successor() else {
            return Err(NavError::AtLastStep(
                self.graph.step_name(current).to_string(),
            ));
        };
        match self.graph.settle(successor, properties)? {
            Landing::Step(step) => Ok(step),
            Landing::End { last } => Err(NavError::DeadEnd {
                from: self.graph.step_name(current).to_string(),
                segment: self.graph.segment(last).name().to_string(),
            }),
        }
    }
}
