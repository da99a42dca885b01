// Path segments: nodes of the compiled navigation graph.
//
// Segments live in an arena (`PathGraph`) and refer to each other by `SegmentId`.

use crate::navigation::condition::{Condition, Properties};
use crate::navigation::error::NavError;
use crate::navigation::step::StepId;
use log::debug;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub(crate) usize);

impl SegmentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered run of steps followed by at most one successor segment.
#[derive(Debug, Clone)]
pub struct LinearSegment {
    name: String,
    steps: Vec<StepId>,
    successor: Option<SegmentId>,
}

impl LinearSegment {
    pub fn new(name: impl Into<String>, steps: Vec<StepId>, successor: Option<SegmentId>) -> Self {
        Self {
            name: name.into(),
            steps,
            successor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.steps.contains(&step)
    }

    pub fn first_step(&self) -> Option<StepId> {
        self.steps.first().copied()
    }

    pub fn last_step(&self) -> Option<StepId> {
        self.steps.last().copied()
    }

    pub fn is_first(&self, step: StepId) -> bool {
        self.first_step() == Some(step)
    }

    pub fn is_last(&self, step: StepId) -> bool {
        self.last_step() == Some(step)
    }

    pub fn step_after(&self, step: StepId) -> Result<StepId, NavError> {
        let pos = self
            .steps
            .iter()
            .position(|s| *s == step)
            .ok_or_else(|| NavError::StepNotInSegment {
                step,
                segment: self.name.clone(),
            })?;
        self.steps
            .get(pos + 1)
            .copied()
            .ok_or_else(|| NavError::NoStepAfter {
                step,
                segment: self.name.clone(),
            })
    }

    /// `None` marks the terminal segment of a walk.
    pub fn successor(&self) -> Option<SegmentId> {
        self.successor
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub target: SegmentId,
    pub condition: Condition,
}

/// Conditional fork: candidates are tried in declared order, first match wins.
#[derive(Debug, Clone)]
pub struct BranchingSegment {
    name: String,
    candidates: Vec<Candidate>,
}

impl BranchingSegment {
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// True when the last candidate can never fail to match.
    pub fn has_fallback(&self) -> bool {
        self.candidates
            .last()
            .map(|c| c.condition.is_always())
            .unwrap_or(false)
    }

    pub fn resolve_successor(&self, properties: &Properties) -> Result<SegmentId, NavError> {
        let chosen = self
            .candidates
            .iter()
            .find(|c| c.condition.evaluate(properties))
            .ok_or_else(|| NavError::NoPathSelected(self.name.clone()))?;
        debug!(
            "[PHASE: navigation] [STEP: branch] '{}' selected {} via condition '{}'",
            self.name,
            chosen.target,
            chosen.condition.name()
        );
        Ok(chosen.target)
    }
}

#[derive(Debug, Clone)]
pub enum PathSegment {
    Linear(LinearSegment),
    Branching(BranchingSegment),
}

impl PathSegment {
    pub fn name(&self) -> &str {
        match self {
            PathSegment::Linear(s) => s.name(),
            PathSegment::Branching(s) => s.name(),
        }
    }

    /// Steps owned by the segment; branch points own none.
    pub fn steps(&self) -> &[StepId] {
        match self {
            PathSegment::Linear(s) => s.steps(),
            PathSegment::Branching(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps().is_empty()
    }

    pub fn as_linear(&self) -> Option<&LinearSegment> {
        match self {
            PathSegment::Linear(s) => Some(s),
            PathSegment::Branching(_) => None,
        }
    }

    /// Segment that follows this one for the given properties; `Ok(None)` when terminal.
    pub fn next_segment(&self, properties: &Properties) -> Result<Option<SegmentId>, NavError> {
        match self {
            PathSegment::Linear(s) => Ok(s.successor()),
            PathSegment::Branching(s) => s.resolve_successor(properties).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Vec<StepId> {
        raw.iter().map(|i| StepId(*i)).collect()
    }

    fn equals(name: &str, property: &'static str, value: &'static str) -> Condition {
        Condition::new(name, move |p: &Properties| p.get(property) == Some(value))
    }

    #[test]
    fn linear_first_last_and_step_after() {
        let seg = LinearSegment::new("main", ids(&[4, 7, 9]), Some(SegmentId(2)));
        assert_eq!(seg.first_step(), Some(StepId(4)));
        assert_eq!(seg.last_step(), Some(StepId(9)));
        assert!(seg.is_first(StepId(4)));
        assert!(seg.is_last(StepId(9)));
        assert!(!seg.is_last(StepId(7)));
        assert_eq!(seg.step_after(StepId(4)), Ok(StepId(7)));
        assert_eq!(seg.step_after(StepId(7)), Ok(StepId(9)));
        assert_eq!(seg.successor(), Some(SegmentId(2)));
    }

    #[test]
    fn step_after_fails_for_last_or_foreign_steps() {
        let seg = LinearSegment::new("main", ids(&[1, 2]), None);
        assert!(matches!(
            seg.step_after(StepId(2)),
            Err(NavError::NoStepAfter { .. })
        ));
        assert!(matches!(
            seg.step_after(StepId(5)),
            Err(NavError::StepNotInSegment { .. })
        ));
    }

    #[test]
    fn empty_linear_segment_has_no_first_or_last() {
        let seg = LinearSegment::new("unix", Vec::new(), None);
        assert!(seg.is_empty());
        assert_eq!(seg.first_step(), None);
        assert_eq!(seg.last_step(), None);
        assert!(!seg.is_first(StepId(0)));
    }

    #[test]
    fn branching_picks_first_true_candidate_in_order() {
        let seg = BranchingSegment::new(
            "platform",
            vec![
                Candidate {
                    target: SegmentId(1),
                    condition: equals("c1", "os", "linux"),
                },
                Candidate {
                    target: SegmentId(2),
                    condition: equals("c2", "os", "windows"),
                },
                Candidate {
                    target: SegmentId(3),
                    condition: Condition::always(),
                },
            ],
        );
        assert!(seg.has_fallback());

        let mut p = Properties::new();
        assert_eq!(seg.resolve_successor(&p), Ok(SegmentId(3)));
        p.set("os", "windows");
        assert_eq!(seg.resolve_successor(&p), Ok(SegmentId(2)));
        p.set("os", "linux");
        assert_eq!(seg.resolve_successor(&p), Ok(SegmentId(1)));
    }

    #[test]
    fn overlapping_conditions_resolve_to_the_earlier_candidate() {
        let seg = BranchingSegment::new(
            "both",
            vec![
                Candidate {
                    target: SegmentId(5),
                    condition: Condition::new("a", |_: &Properties| true),
                },
                Candidate {
                    target: SegmentId(6),
                    condition: Condition::always(),
                },
            ],
        );
        assert_eq!(seg.resolve_successor(&Properties::new()), Ok(SegmentId(5)));
    }

    #[test]
    fn branching_without_match_fails_with_no_path_selected() {
        let seg = BranchingSegment::new(
            "platform",
            vec![Candidate {
                target: SegmentId(1),
                condition: equals("c1", "os", "linux"),
            }],
        );
        assert!(!seg.has_fallback());
        assert_eq!(
            seg.resolve_successor(&Properties::new()),
            Err(NavError::NoPathSelected("platform".to_string()))
        );
    }

    #[test]
    fn path_segment_dispatches_by_variant() {
        let linear = PathSegment::Linear(LinearSegment::new("a", ids(&[0]), None));
        assert_eq!(linear.steps(), &[StepId(0)]);
        assert_eq!(linear.next_segment(&Properties::new()), Ok(None));
        assert!(linear.as_linear().is_some());

        let branching = PathSegment::Branching(BranchingSegment::new(
            "b",
            vec![Candidate {
                target: SegmentId(0),
                condition: Condition::always(),
            }],
        ));
        assert!(branching.is_empty());
        assert!(branching.as_linear().is_none());
        assert_eq!(
            branching.next_segment(&Properties::new()),
            Ok(Some(SegmentId(0)))
        );
    }
}
