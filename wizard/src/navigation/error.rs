// Navigation engine errors
//
// Every variant is a configuration or caller-contract defect. None of them are retried.

use crate::navigation::step::StepId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
    // ---- build time -------------------------------------------------------
    #[error("wizard spec declares no main path named '{0}'")]
    MissingMainPath(String),
    #[error("main path '{0}' has no entries")]
    EmptyMainPath(String),
    #[error("branch '{branch}' references undeclared path '{path}'")]
    UndeclaredPath { branch: String, path: String },
    #[error("path '{0}' is reachable from its own branches")]
    RecursivePath(String),
    #[error("branch '{0}' has no candidates and nothing follows it")]
    EmptyBranch(String),
    #[error("step '{step}' declares unknown type '{kind}'")]
    UnknownStepType { step: String, kind: String },
    #[error("step name '{0}' is declared more than once")]
    DuplicateStep(String),
    #[error("branch '{branch}' references unknown condition '{condition}'")]
    UnknownCondition { branch: String, condition: String },
    #[error("condition '{name}' is invalid: {reason}")]
    InvalidCondition { name: String, reason: String },
    #[error("step '{step}' could not be created: {reason}")]
    StepCreation { step: String, reason: String },

    // ---- traversal time ---------------------------------------------------
    #[error("no next path selected at branch '{0}'")]
    NoPathSelected(String),
    #[error("{step} is not part of segment '{segment}'")]
    StepNotInSegment { step: StepId, segment: String },
    #[error("{step} is the last step of segment '{segment}'")]
    NoStepAfter { step: StepId, segment: String },
    #[error("step '{0}' is the last step of the wizard")]
    AtLastStep(String),
    #[error("no step follows '{from}': the walk ends in empty segment '{segment}'")]
    DeadEnd { from: String, segment: String },
    #[error("no step is reachable from root segment '{0}'")]
    NoReachableStep(String),
    #[error("walk did not reach a step after visiting {0} segments")]
    EmptySegmentCycle(usize),
    #[error("navigation history has no earlier step")]
    HistoryUnderflow,
    #[error("step '{0}' does not allow going back right now")]
    PreviousBlocked(String),
    #[error("navigation has not been started")]
    NotStarted,
}

impl NavError {
    /// True for errors raised while compiling the graph (before any step is shown).
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            NavError::MissingMainPath(_)
                | NavError::EmptyMainPath(_)
                | NavError::UndeclaredPath { .. }
                | NavError::RecursivePath(_)
                | NavError::EmptyBranch(_)
                | NavError::UnknownStepType { .. }
                | NavError::DuplicateStep(_)
                | NavError::UnknownCondition { .. }
                | NavError::InvalidCondition { .. }
                | NavError::StepCreation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_are_classified() {
        assert!(NavError::EmptyMainPath("main".to_string()).is_build_error());
        assert!(NavError::UndeclaredPath {
            branch: "os".to_string(),
            path: "unix".to_string()
        }
        .is_build_error());
        assert!(!NavError::HistoryUnderflow.is_build_error());
        assert!(!NavError::PreviousBlocked("license".to_string()).is_build_error());
        assert!(!NavError::NoPathSelected("os".to_string()).is_build_error());
    }

    #[test]
    fn messages_name_the_offending_items() {
        let e = NavError::UnknownStepType {
            step: "perms".to_string(),
            kind: "widget".to_string(),
        };
        assert_eq!(e.to_string(), "step 'perms' declares unknown type 'widget'");

        let e = NavError::NoStepAfter {
            step: StepId(3),
            segment: "main".to_string(),
        };
        assert_eq!(e.to_string(), "step#3 is the last step of segment 'main'");
    }
}
