// Declarative wizard spec (TOML or JSON)
//
// main = "main"
// [conditions.is_linux]        kind = "equals", property = "os", value = "linux"
// [[paths.main]]               step = "welcome", type = "info"
// [[paths.main]]               branch = "platform", candidates = [{ path = "unix", condition = "is_linux" }]

use crate::navigation::{
    ConditionRegistry, ConditionSpec, NavError, PathGraph, PathGraphBuilder, StepDecl, StepRegistry,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEMO_SPEC: &str = include_str!("../specs/demo.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSpec {
    #[serde(default = "default_main")]
    pub main: String,
    #[serde(default)]
    pub conditions: BTreeMap<String, ConditionSpec>,
    pub paths: BTreeMap<String, Vec<PathEntry>>,
}

fn default_main() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathEntry {
    Step(StepEntry),
    Branch(BranchEntry),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepEntry {
    pub step: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl StepEntry {
    pub fn new(step: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Step declaration with every property flattened to a string.
    pub fn decl(&self) -> StepDecl {
        let mut decl = StepDecl::new(self.step.clone(), self.kind.clone());
        for (key, value) in &self.properties {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.to_string(),
            };
            decl.properties.insert(key.clone(), text);
        }
        decl
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchEntry {
    pub branch: String,
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateEntry {
    pub path: String,
    #[serde(default = "default_condition")]
    pub condition: String,
}

fn default_condition() -> String {
    crate::navigation::condition::ALWAYS.to_string()
}

impl WizardSpec {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse wizard spec (TOML)")
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse wizard spec (JSON)")
    }

    /// Load a spec file; `.json` is parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read wizard spec {:?}", path))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let spec = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        };
        spec.with_context(|| format!("Invalid wizard spec {:?}", path))
    }

    /// Spec bundled with the binary, used when no spec file is configured.
    pub fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO_SPEC)
    }

    pub fn condition_registry(&self) -> Result<ConditionRegistry, NavError> {
        ConditionRegistry::from_specs(&self.conditions)
    }

    pub fn compile(&self, step_types: &StepRegistry) -> Result<PathGraph, NavError> {
        let conditions = self.condition_registry()?;
        self.compile_with(&conditions, step_types)
    }

    /// Compile against a caller-supplied registry (e.g. with programmatic conditions added).
    pub fn compile_with(
        &self,
        conditions: &ConditionRegistry,
        step_types: &StepRegistry,
    ) -> Result<PathGraph, NavError> {
        PathGraphBuilder::new(conditions, step_types).build(&self.main, &self.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::step::testing::fake_registry;
    use crate::navigation::PathSegment;
    use std::io::Write;

    const PLATFORM_TOML: &str = r#"
main = "main"

[conditions.is_linux]
kind = "equals"
property = "os"
value = "linux"

[[paths.main]]
step = "welcome"
type = "fake"
properties = { title = "Welcome", retries = 3, required = true, options = ["a", "b"] }

[[paths.main]]
branch = "platform"
candidates = [ { path = "unix", condition = "is_linux" }, { path = "windows" } ]

[[paths.unix]]
step = "perms"
type = "fake"

[[paths.windows]]
step = "registry"
type = "fake"
"#;

    #[test]
    fn parses_steps_branches_and_conditions_from_toml() {
        let spec = WizardSpec::from_toml_str(PLATFORM_TOML).expect("parse");
        assert_eq!(spec.main, "main");
        assert_eq!(spec.paths.len(), 3);
        assert!(spec.conditions.contains_key("is_linux"));

        let main = &spec.paths["main"];
        assert!(matches!(main[0], PathEntry::Step(_)));
        let PathEntry::Branch(branch) = &main[1] else {
            panic!("expected branch entry");
        };
        assert_eq!(branch.branch, "platform");
        assert_eq!(branch.candidates[1].condition, "always");
    }

    #[test]
    fn step_properties_are_flattened_to_strings() {
        let spec = WizardSpec::from_toml_str(PLATFORM_TOML).expect("parse");
        let PathEntry::Step(step) = &spec.paths["main"][0] else {
            panic!("expected step entry");
        };
        let decl = step.decl();
        assert_eq!(decl.property("title"), Some("Welcome"));
        assert_eq!(decl.property("retries"), Some("3"));
        assert_eq!(decl.property("required"), Some("true"));
        assert_eq!(decl.property("options"), Some("a,b"));
    }

    #[test]
    fn compiles_into_graph_with_branch() {
        let spec = WizardSpec::from_toml_str(PLATFORM_TOML).expect("parse");
        let graph = spec.compile(&fake_registry()).expect("compile");
        assert_eq!(graph.steps().len(), 3);
        let branches = graph
            .segments()
            .filter(|(_, s)| matches!(s, PathSegment::Branching(_)))
            .count();
        assert_eq!(branches, 1);
    }

    #[test]
    fn parses_json_with_same_shape() {
        let json = r#"{
            "paths": {
                "main": [
                    { "step": "welcome", "type": "fake" },
                    { "branch": "os", "candidates": [ { "path": "unix" } ] }
                ],
                "unix": []
            }
        }"#;
        let spec = WizardSpec::from_json_str(json).expect("parse");
        assert_eq!(spec.main, "main");
        assert_eq!(spec.paths["unix"].len(), 0);
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let text = r#"
[[paths.main]]
stepp = "typo"
type = "fake"
"#;
        assert!(WizardSpec::from_toml_str(text).is_err());
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().expect("tempdir");

        let toml_path = dir.path().join("wizard.toml");
        std::fs::write(&toml_path, PLATFORM_TOML).expect("write toml");
        assert_eq!(WizardSpec::load(&toml_path).expect("load toml").paths.len(), 3);

        let json_path = dir.path().join("wizard.json");
        let mut f = std::fs::File::create(&json_path).expect("create json");
        f.write_all(br#"{ "main": "start", "paths": { "start": [ { "step": "only", "type": "fake" } ] } }"#)
            .expect("write json");
        let spec = WizardSpec::load(&json_path).expect("load json");
        assert_eq!(spec.main, "start");

        let missing = dir.path().join("missing.toml");
        let err = WizardSpec::load(&missing).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read wizard spec"));
    }

    #[test]
    fn undeclared_condition_reference_fails_compile() {
        let text = r#"
[[paths.main]]
step = "welcome"
type = "fake"

[[paths.main]]
branch = "os"
candidates = [ { path = "unix", condition = "is_bsd" } ]

[[paths.unix]]
step = "perms"
type = "fake"
"#;
        let spec = WizardSpec::from_toml_str(text).expect("parse");
        let err = spec.compile(&fake_registry()).unwrap_err();
        assert!(matches!(err, NavError::UnknownCondition { .. }));
    }

    #[test]
    fn redefining_always_fails_compile() {
        let text = r#"
[conditions.always]
kind = "never"

[[paths.main]]
step = "welcome"
type = "fake"

[[paths.main]]
branch = "os"
candidates = [ { path = "unix" } ]

[[paths.main]]
step = "done"
type = "fake"

[[paths.unix]]
step = "perms"
type = "fake"
"#;
        let spec = WizardSpec::from_toml_str(text).expect("parse");
        let err = spec.compile(&fake_registry()).unwrap_err();
        assert!(matches!(err, NavError::InvalidCondition { .. }), "{:?}", err);
    }

    #[test]
    fn bundled_demo_spec_parses() {
        let spec = WizardSpec::demo().expect("demo spec");
        assert_eq!(spec.main, "main");
        assert!(spec.paths.contains_key("ready"));
    }
}
