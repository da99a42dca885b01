// Wizard path navigation engine
//
// `PathGraphBuilder` compiles declared paths into an immutable `PathGraph`;
// `NavigationModel` walks it (next / previous / jump to last / reset).

pub mod condition;
pub mod error;
pub mod graph;
pub mod model;
pub mod segment;
pub mod step;

pub use condition::{Condition, ConditionRegistry, ConditionSpec, Properties};
pub use error::NavError;
pub use graph::{Landing, PathGraph, PathGraphBuilder};
pub use model::NavigationModel;
pub use segment::{BranchingSegment, Candidate, LinearSegment, PathSegment, SegmentId};
pub use step::{Step, StepContext, StepDecl, StepId, StepInput, StepRegistry, StepView};
