// Compiled navigation graph and the builder that produces it.
//
// Each named path is compiled back to front so a segment's successor always exists before the
// segment itself. Named paths are memoized: a path referenced from several branches is built once
// and shared. Self-referencing paths are rejected, so the compiled graph is acyclic.

use crate::navigation::condition::{Condition, ConditionRegistry, Properties};
use crate::navigation::error::NavError;
use crate::navigation::segment::{BranchingSegment, Candidate, LinearSegment, PathSegment, SegmentId};
use crate::navigation::step::{StepDecl, StepId, StepRegistry};
use crate::spec::{BranchEntry, PathEntry};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Where a walk over segments stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// First step of the first non-empty segment reached.
    Step(StepId),
    /// The walk ran out of segments; `last` is the terminal (empty) segment.
    End { last: SegmentId },
}

/// Immutable arena of segments and step declarations.
#[derive(Debug, Clone)]
pub struct PathGraph {
    segments: Vec<PathSegment>,
    steps: Vec<StepDecl>,
    owners: Vec<SegmentId>,
    root: SegmentId,
}

impl PathGraph {
    pub fn root(&self) -> SegmentId {
        self.root
    }

    pub fn segment(&self, id: SegmentId) -> &PathSegment {
        &self.segments[id.0]
    }

    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &PathSegment)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, s)| (SegmentId(i), s))
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn steps(&self) -> &[StepDecl] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> &StepDecl {
        &self.steps[id.0]
    }

    pub fn step_name(&self, id: StepId) -> &str {
        &self.steps[id.0].name
    }

    pub fn step_id(&self, name: &str) -> Option<StepId> {
        self.steps.iter().position(|s| s.name == name).map(StepId)
    }

    /// The linear segment that owns `step`.
    pub fn segment_of(&self, step: StepId) -> SegmentId {
        self.owners[step.0]
    }

    pub fn owning_segment(&self, step: StepId) -> Result<&LinearSegment, NavError> {
        let id = self.segment_of(step);
        self.segment(id)
            .as_linear()
            .ok_or_else(|| NavError::StepNotInSegment {
                step,
                segment: self.segment(id).name().to_string(),
            })
    }

    /// Walk from `from` (inclusive), skipping empty segments, until a step is found.
    pub fn settle(&self, from: SegmentId, properties: &Properties) -> Result<Landing, NavError> {
        let mut current = from;
        let mut visited = 0usize;
        loop {
            visited += 1;
            if visited > self.segments.len() {
                return Err(NavError::EmptySegmentCycle(visited));
            }
            let segment = self.segment(current);
            if let Some(first) = segment.steps().first() {
                return Ok(Landing::Step(*first));
            }
            debug!(
                "[PHASE: navigation] [STEP: skip] Skipping empty segment '{}' ({})",
                segment.name(),
                current
            );
            match segment.next_segment(properties)? {
                Some(next) => current = next,
                None => return Ok(Landing::End { last: current }),
            }
        }
    }

    /// Every step on the walk from the root to its terminal segment, in order.
    pub fn walk_steps(&self, properties: &Properties) -> Result<Vec<StepId>, NavError> {
        let mut current = self.root;
        let mut steps = Vec::new();
        let mut visited = 0usize;
        loop {
            visited += 1;
            if visited > self.segments.len() {
                return Err(NavError::EmptySegmentCycle(visited));
            }
            let segment = self.segment(current);
            steps.extend_from_slice(segment.steps());
            match segment.next_segment(properties)? {
                Some(next) => current = next,
                None => return Ok(steps),
            }
        }
    }

    /// Last step on the walk from the root to its terminal segment.
    pub fn last_step(&self, properties: &Properties) -> Result<StepId, NavError> {
        self.walk_steps(properties)?
            .last()
            .copied()
            .ok_or_else(|| NavError::NoReachableStep(self.segment(self.root).name().to_string()))
    }
}

impl fmt::Display for PathGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "root {}", self.root)?;
        for (id, segment) in self.segments() {
            match segment {
                PathSegment::Linear(s) => {
                    let names: Vec<&str> = s.steps().iter().map(|st| self.step_name(*st)).collect();
                    let next = s
                        .successor()
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "end".to_string());
                    writeln!(f, "{} linear '{}' [{}] -> {}", id, s.name(), names.join(", "), next)?;
                }
                PathSegment::Branching(s) => {
                    writeln!(f, "{} branch '{}'", id, s.name())?;
                    for c in s.candidates() {
                        writeln!(f, "    if {} -> {}", c.condition.name(), c.target)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Compiles declared paths into a `PathGraph`.
pub struct PathGraphBuilder<'a> {
    conditions: &'a ConditionRegistry,
    step_types: &'a StepRegistry,
    segments: Vec<PathSegment>,
    steps: Vec<StepDecl>,
    owners: Vec<SegmentId>,
    step_names: HashSet<String>,
    built: HashMap<String, SegmentId>,
    building: Vec<String>,
}

impl<'a> PathGraphBuilder<'a> {
    pub fn new(conditions: &'a ConditionRegistry, step_types: &'a StepRegistry) -> Self {
        Self {
            conditions,
            step_types,
            segments: Vec::new(),
            steps: Vec::new(),
            owners: Vec::new(),
            step_names: HashSet::new(),
            built: HashMap::new(),
            building: Vec::new(),
        }
    }

    /// Build the graph rooted at path `main`. `paths` holds every declared path, `main` included.
    pub fn build(
        mut self,
        main: &str,
        paths: &BTreeMap<String, Vec<PathEntry>>,
    ) -> Result<PathGraph, NavError> {
        let entries = paths
            .get(main)
            .ok_or_else(|| NavError::MissingMainPath(main.to_string()))?;
        if entries.is_empty() {
            return Err(NavError::EmptyMainPath(main.to_string()));
        }

        let root = self.build_path(main, main, paths)?;

        for name in paths.keys().filter(|p| !self.built.contains_key(*p)) {
            warn!(
                "[PHASE: build] Path '{}' is declared but no branch references it",
                name
            );
        }
        info!(
            "[PHASE: build] Compiled wizard graph: {} segments, {} steps, root '{}'",
            self.segments.len(),
            self.steps.len(),
            main
        );

        Ok(PathGraph {
            segments: self.segments,
            steps: self.steps,
            owners: self.owners,
            root,
        })
    }

    fn build_path(
        &mut self,
        name: &str,
        referenced_by: &str,
        paths: &BTreeMap<String, Vec<PathEntry>>,
    ) -> Result<SegmentId, NavError> {
        if let Some(id) = self.built.get(name) {
            return Ok(*id);
        }
        if self.building.iter().any(|p| p == name) {
            return Err(NavError::RecursivePath(name.to_string()));
        }
        let entries = paths.get(name).ok_or_else(|| NavError::UndeclaredPath {
            branch: referenced_by.to_string(),
            path: name.to_string(),
        })?;

        self.building.push(name.to_string());
        let head = self.build_entries(name, entries, paths);
        self.building.pop();

        let head = head?;
        self.built.insert(name.to_string(), head);
        Ok(head)
    }

    fn build_entries(
        &mut self,
        path: &str,
        entries: &[PathEntry],
        paths: &BTreeMap<String, Vec<PathEntry>>,
    ) -> Result<SegmentId, NavError> {
        let mut next: Option<SegmentId> = None;
        // Collected back to front.
        let mut pending: Vec<StepDecl> = Vec::new();

        for entry in entries.iter().rev() {
            match entry {
                PathEntry::Step(step) => {
                    let decl = step.decl();
                    self.check_step(&decl)?;
                    pending.push(decl);
                }
                PathEntry::Branch(branch) => {
                    if !pending.is_empty() {
                        next = Some(self.push_linear(path, &mut pending, next));
                    }
                    let segment = self.build_branch(branch, next, paths)?;
                    next = Some(self.push(PathSegment::Branching(segment)));
                }
            }
        }

        let head = match next {
            Some(head) if pending.is_empty() => head,
            // Leading steps, or a path with no entries at all (an empty segment).
            successor => self.push_linear(path, &mut pending, successor),
        };
        Ok(head)
    }

    fn build_branch(
        &mut self,
        branch: &BranchEntry,
        fall_through: Option<SegmentId>,
        paths: &BTreeMap<String, Vec<PathEntry>>,
    ) -> Result<BranchingSegment, NavError> {
        let mut candidates = Vec::with_capacity(branch.candidates.len() + 1);
        for candidate in &branch.candidates {
            let condition = self
                .conditions
                .get(&candidate.condition)
                .cloned()
                .ok_or_else(|| NavError::UnknownCondition {
                    branch: branch.branch.clone(),
                    condition: candidate.condition.clone(),
                })?;
            let target = self.build_path(&candidate.path, &branch.branch, paths)?;
            candidates.push(Candidate { target, condition });
        }

        let explicit_fallback = candidates
            .last()
            .map(|c| c.condition.is_always())
            .unwrap_or(false);
        match fall_through {
            Some(target) if !explicit_fallback => candidates.push(Candidate {
                target,
                condition: Condition::always(),
            }),
            Some(_) => debug!(
                "[PHASE: build] Branch '{}' ends in an explicit fallback; entries after it are unreachable through it",
                branch.branch
            ),
            None => {}
        }

        if candidates.is_empty() {
            return Err(NavError::EmptyBranch(branch.branch.clone()));
        }
        let segment = BranchingSegment::new(branch.branch.clone(), candidates);
        if !segment.has_fallback() {
            warn!(
                "[PHASE: build] Branch '{}' has no fallback candidate; it fails at runtime when no condition matches",
                branch.branch
            );
        }
        Ok(segment)
    }

    fn check_step(&mut self, decl: &StepDecl) -> Result<(), NavError> {
        if !self.step_types.contains(&decl.kind) {
            return Err(NavError::UnknownStepType {
                step: decl.name.clone(),
                kind: decl.kind.clone(),
            });
        }
        if !self.step_names.insert(decl.name.clone()) {
            return Err(NavError::DuplicateStep(decl.name.clone()));
        }
        Ok(())
    }

    fn push(&mut self, segment: PathSegment) -> SegmentId {
        self.segments.push(segment);
        SegmentId(self.segments.len() - 1)
    }

    fn push_linear(
        &mut self,
        path: &str,
        pending: &mut Vec<StepDecl>,
        successor: Option<SegmentId>,
    ) -> SegmentId {
        let id = SegmentId(self.segments.len());
        let mut step_ids = Vec::with_capacity(pending.len());
        for decl in pending.drain(..).rev() {
            step_ids.push(StepId(self.steps.len()));
            self.steps.push(decl);
            self.owners.push(id);
        }
        self.push(PathSegment::Linear(LinearSegment::new(path, step_ids, successor)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::spec::{BranchEntry, CandidateEntry, PathEntry, StepEntry};

    pub fn step(name: &str) -> PathEntry {
        PathEntry::Step(StepEntry::new(name, "fake"))
    }

    /// Fake step with declared properties (e.g. `("busy", "true")`).
    pub fn step_with(name: &str, properties: &[(&str, &str)]) -> PathEntry {
        let mut entry = StepEntry::new(name, "fake");
        for (key, value) in properties {
            entry
                .properties
                .insert(key.to_string(), serde_json::Value::String(value.to_string()));
        }
        PathEntry::Step(entry)
    }

    pub fn branch(name: &str, candidates: &[(&str, &str)]) -> PathEntry {
        PathEntry::Branch(BranchEntry {
            branch: name.to_string(),
            candidates: candidates
                .iter()
                .map(|(path, condition)| CandidateEntry {
                    path: path.to_string(),
                    condition: condition.to_string(),
                })
                .collect(),
        })
    }
}
