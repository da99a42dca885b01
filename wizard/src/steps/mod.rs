// Built-in step types
//
// Registered by type name in `builtin_registry()`; wizard specs refer to them through `type = "..."`.

mod choice;
mod info;
mod input;
mod license;
mod summary;

pub use choice::ChoiceStep;
pub use info::InfoStep;
pub use input::{InputStep, TextInput};
pub use license::LicenseStep;
pub use summary::SummaryStep;

use crate::navigation::{Step, StepDecl, StepRegistry};

/// Registry with every built-in step type.
pub fn builtin_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry.register("info", |decl: &StepDecl| {
        Ok(Box::new(InfoStep::from_decl(decl)) as Box<dyn Step>)
    });
    registry.register("license", |decl: &StepDecl| {
        Ok(Box::new(LicenseStep::from_decl(decl)) as Box<dyn Step>)
    });
    registry.register("input", |decl: &StepDecl| {
        InputStep::from_decl(decl).map(|s| Box::new(s) as Box<dyn Step>)
    });
    registry.register("choice", |decl: &StepDecl| {
        ChoiceStep::from_decl(decl).map(|s| Box::new(s) as Box<dyn Step>)
    });
    registry.register("summary", |decl: &StepDecl| {
        Ok(Box::new(SummaryStep::from_decl(decl)) as Box<dyn Step>)
    });
    registry
}

/// Title property, falling back to the step name.
fn title_of(decl: &StepDecl) -> String {
    decl.property("title")
        .map(str::to_string)
        .unwrap_or_else(|| decl.name.clone())
}

/// Comma separated list property, trimmed, empties dropped.
fn list_of(decl: &StepDecl, key: &str) -> Vec<String> {
    decl.property(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::StepContext;
    use crate::spec::WizardSpec;

    #[test]
    fn builtin_registry_knows_all_types() {
        let registry = builtin_registry();
        assert_eq!(
            registry.kinds(),
            vec!["choice", "info", "input", "license", "summary"]
        );
    }

    #[test]
    fn demo_spec_instantiates_with_builtins() {
        let spec = WizardSpec::demo().expect("demo spec");
        let registry = builtin_registry();
        let graph = spec.compile(&registry).expect("compile");
        let steps = registry.instantiate(&graph).expect("instantiate");
        assert_eq!(steps.len(), graph.steps().len());
        for (step, decl) in steps.iter().zip(graph.steps()) {
            assert_eq!(step.name(), decl.name);
            let view = step.view(&StepContext::default());
            assert!(!view.title.is_empty(), "{} has no title", decl.name);
        }
    }

    #[test]
    fn list_of_splits_and_trims() {
        let decl = StepDecl::new("s", "choice").with_property("options", " a, b ,,c ");
        assert_eq!(list_of(&decl, "options"), vec!["a", "b", "c"]);
        assert!(list_of(&decl, "missing").is_empty());
        assert_eq!(title_of(&decl), "s");
    }
}
