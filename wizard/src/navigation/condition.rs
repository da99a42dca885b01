// Branch conditions and the property store they read.
//
// A condition is a pure predicate over `Properties`. Declarative conditions from the wizard spec
// are compiled once at startup into closures; referencing an unknown or cyclic condition fails
// there, not while the wizard is running.

use crate::navigation::error::NavError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Name of the condition that is always satisfied (registered implicitly).
pub const ALWAYS: &str = "always";

/// Runtime property store: conditions read it, steps write it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// "true" | "yes" | "1" (case-insensitive) count as set.
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        props.extend(iter);
        props
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Properties {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

type Predicate = dyn Fn(&Properties) -> bool + Send + Sync;

/// A named, stateless predicate over `Properties`.
#[derive(Clone)]
pub struct Condition {
    name: String,
    predicate: Arc<Predicate>,
    fallback: bool,
}

impl Condition {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Properties) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            fallback: false,
        }
    }

    /// Condition that matches any properties; a branch ending in one can never be exhausted.
    pub fn unconditional(name: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::new(name, |_| true)
        }
    }

    pub fn always() -> Self {
        Self::unconditional(ALWAYS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for unconditional conditions, whatever their name.
    pub fn is_always(&self) -> bool {
        self.fallback
    }

    pub fn evaluate(&self, properties: &Properties) -> bool {
        (self.predicate)(properties)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Declarative condition as written in a wizard spec file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionSpec {
    Always,
    Never,
    Equals { property: String, value: String },
    NotEquals { property: String, value: String },
    Matches { property: String, pattern: String },
    Exists { property: String },
    IsTrue { property: String },
    Not { condition: String },
    All { conditions: Vec<String> },
    Any { conditions: Vec<String> },
}

/// Named conditions available to branch declarations.
#[derive(Debug, Clone)]
pub struct ConditionRegistry {
    conditions: HashMap<String, Condition>,
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionRegistry {
    pub fn new() -> Self {
        let mut conditions = HashMap::new();
        conditions.insert(ALWAYS.to_string(), Condition::always());
        Self { conditions }
    }

    /// Register a programmatic condition (replaces any existing one with the same name).
    ///
    /// `always` is reserved and cannot be replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<(), NavError>
    where
        F: Fn(&Properties) -> bool + Send + Sync + 'static,
    {
        self.insert(Condition::new(name, predicate))
    }

    pub fn insert(&mut self, condition: Condition) -> Result<(), NavError> {
        check_not_reserved(condition.name())?;
        self.conditions
            .insert(condition.name().to_string(), condition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Compile declarative conditions into this registry.
    ///
    /// Declared names shadow programmatic ones; `not`/`all`/`any` may reference either.
    pub fn compile_specs(&mut self, specs: &BTreeMap<String, ConditionSpec>) -> Result<(), NavError> {
        for name in specs.keys() {
            check_not_reserved(name)?;
        }
        let mut compiler = Compiler {
            specs,
            base: &self.conditions,
            compiled: HashMap::new(),
            visiting: Vec::new(),
        };
        for name in specs.keys() {
            compiler.resolve(name)?;
        }
        let compiled = compiler.compiled;
        self.conditions.extend(compiled);
        Ok(())
    }

    pub fn from_specs(specs: &BTreeMap<String, ConditionSpec>) -> Result<Self, NavError> {
        let mut registry = Self::new();
        registry.compile_specs(specs)?;
        Ok(registry)
    }
}

fn check_not_reserved(name: &str) -> Result<(), NavError> {
    if name == ALWAYS {
        return Err(NavError::InvalidCondition {
            name: name.to_string(),
            reason: "the name is reserved for the built-in fallback condition".to_string(),
        });
    }
    Ok(())
}

struct Compiler<'a> {
    specs: &'a BTreeMap<String, ConditionSpec>,
    base: &'a HashMap<String, Condition>,
    compiled: HashMap<String, Condition>,
    visiting: Vec<String>,
}

impl Compiler<'_> {
    fn resolve(&mut self, name: &str) -> Result<Condition, NavError> {
        if let Some(c) = self.compiled.get(name) {
            return Ok(c.clone());
        }
        let Some(spec) = self.specs.get(name) else {
            return self.base.get(name).cloned().ok_or_else(|| NavError::InvalidCondition {
                name: name.to_string(),
                reason: "condition is not declared".to_string(),
            });
        };
        if self.visiting.iter().any(|n| n == name) {
            return Err(NavError::InvalidCondition {
                name: name.to_string(),
                reason: format!("reference cycle: {} -> {}", self.visiting.join(" -> "), name),
            });
        }

        self.visiting.push(name.to_string());
        let condition = self.compile(name, spec);
        self.visiting.pop();

        let condition = condition?;
        self.compiled.insert(name.to_string(), condition.clone());
        Ok(condition)
    }

    fn reference(&mut self, parent: &str, child: &str) -> Result<Condition, NavError> {
        if !self.specs.contains_key(child) && !self.base.contains_key(child) {
            return Err(NavError::InvalidCondition {
                name: parent.to_string(),
                reason: format!("references unknown condition '{}'", child),
            });
        }
        self.resolve(child)
    }

    fn compile(&mut self, name: &str, spec: &ConditionSpec) -> Result<Condition, NavError> {
        let condition = match spec.clone() {
            ConditionSpec::Always => Condition::unconditional(name),
            ConditionSpec::Never => Condition::new(name, |_| false),
            ConditionSpec::Equals { property, value } => {
                Condition::new(name, move |p| p.get(&property) == Some(value.as_str()))
            }
            ConditionSpec::NotEquals { property, value } => {
                Condition::new(name, move |p| p.get(&property) != Some(value.as_str()))
            }
            ConditionSpec::Matches { property, pattern } => {
                let re = Regex::new(&pattern).map_err(|e| NavError::InvalidCondition {
                    name: name.to_string(),
                    reason: format!("bad pattern '{}': {}", pattern, e),
                })?;
                Condition::new(name, move |p| {
                    p.get(&property).map(|v| re.is_match(v)).unwrap_or(false)
                })
            }
            ConditionSpec::Exists { property } => Condition::new(name, move |p| p.contains(&property)),
            ConditionSpec::IsTrue { property } => Condition::new(name, move |p| p.is_true(&property)),
            ConditionSpec::Not { condition } => {
                let inner = self.reference(name, &condition)?;
                Condition::new(name, move |p| !inner.evaluate(p))
            }
            ConditionSpec::All { conditions } => {
                let inner = conditions
                    .iter()
                    .map(|c| self.reference(name, c))
                    .collect::<Result<Vec<_>, _>>()?;
                Condition::new(name, move |p| inner.iter().all(|c| c.evaluate(p)))
            }
            ConditionSpec::Any { conditions } => {
                let inner = conditions
                    .iter()
                    .map(|c| self.reference(name, c))
                    .collect::<Result<Vec<_>, _>>()?;
                Condition::new(name, move |p| inner.iter().any(|c| c.evaluate(p)))
            }
        };
        Ok(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn equals(property: &str, value: &str) -> ConditionSpec {
        ConditionSpec::Equals {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn always_is_registered_implicitly() {
        let registry = ConditionRegistry::new();
        let always = registry.get(ALWAYS).expect("always should exist");
        assert!(always.is_always());
        assert!(always.evaluate(&Properties::new()));
    }

    #[test]
    fn properties_is_true_accepts_common_spellings() {
        let p = props(&[("a", "TRUE"), ("b", "yes"), ("c", "1"), ("d", "no")]);
        assert!(p.is_true("a"));
        assert!(p.is_true("b"));
        assert!(p.is_true("c"));
        assert!(!p.is_true("d"));
        assert!(!p.is_true("missing"));
    }

    #[test]
    fn equals_and_not_equals_compare_property_values() {
        let mut specs = BTreeMap::new();
        specs.insert("is_linux".to_string(), equals("os", "linux"));
        specs.insert(
            "not_linux".to_string(),
            ConditionSpec::NotEquals {
                property: "os".to_string(),
                value: "linux".to_string(),
            },
        );
        let registry = ConditionRegistry::from_specs(&specs).expect("compile");

        let linux = props(&[("os", "linux")]);
        let windows = props(&[("os", "windows")]);
        assert!(registry.get("is_linux").unwrap().evaluate(&linux));
        assert!(!registry.get("is_linux").unwrap().evaluate(&windows));
        assert!(registry.get("not_linux").unwrap().evaluate(&windows));
        assert!(registry.get("not_linux").unwrap().evaluate(&Properties::new()));
    }

    #[test]
    fn matches_uses_regex_and_rejects_bad_patterns() {
        let mut specs = BTreeMap::new();
        specs.insert(
            "debian_like".to_string(),
            ConditionSpec::Matches {
                property: "distro".to_string(),
                pattern: "^(debian|ubuntu)".to_string(),
            },
        );
        let registry = ConditionRegistry::from_specs(&specs).expect("compile");
        let c = registry.get("debian_like").unwrap();
        assert!(c.evaluate(&props(&[("distro", "ubuntu-22.04")])));
        assert!(!c.evaluate(&props(&[("distro", "rhel")])));
        assert!(!c.evaluate(&Properties::new()));

        let mut bad = BTreeMap::new();
        bad.insert(
            "broken".to_string(),
            ConditionSpec::Matches {
                property: "x".to_string(),
                pattern: "(unclosed".to_string(),
            },
        );
        let err = ConditionRegistry::from_specs(&bad).unwrap_err();
        assert!(matches!(err, NavError::InvalidCondition { ref name, .. } if name == "broken"));
    }

    #[test]
    fn combinators_reference_other_conditions() {
        let mut specs = BTreeMap::new();
        specs.insert("is_linux".to_string(), equals("os", "linux"));
        specs.insert("custom".to_string(), equals("install.type", "custom"));
        specs.insert(
            "not_linux".to_string(),
            ConditionSpec::Not {
                condition: "is_linux".to_string(),
            },
        );
        specs.insert(
            "custom_linux".to_string(),
            ConditionSpec::All {
                conditions: vec!["is_linux".to_string(), "custom".to_string()],
            },
        );
        specs.insert(
            "either".to_string(),
            ConditionSpec::Any {
                conditions: vec!["is_linux".to_string(), "custom".to_string()],
            },
        );
        let registry = ConditionRegistry::from_specs(&specs).expect("compile");

        let p = props(&[("os", "windows"), ("install.type", "custom")]);
        assert!(registry.get("not_linux").unwrap().evaluate(&p));
        assert!(!registry.get("custom_linux").unwrap().evaluate(&p));
        assert!(registry.get("either").unwrap().evaluate(&p));
    }

    #[test]
    fn always_cannot_be_redeclared_or_replaced() {
        let mut specs = BTreeMap::new();
        specs.insert(ALWAYS.to_string(), ConditionSpec::Never);
        let err = ConditionRegistry::from_specs(&specs).unwrap_err();
        assert!(matches!(err, NavError::InvalidCondition { ref name, .. } if name == ALWAYS));

        let mut registry = ConditionRegistry::new();
        assert!(registry.register(ALWAYS, |_| false).is_err());
        let always = registry.get(ALWAYS).expect("always should exist");
        assert!(always.is_always());
        assert!(always.evaluate(&Properties::new()));
    }

    #[test]
    fn declared_always_counts_as_fallback_under_any_name() {
        let mut specs = BTreeMap::new();
        specs.insert("otherwise".to_string(), ConditionSpec::Always);
        specs.insert("is_linux".to_string(), equals("os", "linux"));
        let registry = ConditionRegistry::from_specs(&specs).expect("compile");
        assert!(registry.get("otherwise").unwrap().is_always());
        assert!(!registry.get("is_linux").unwrap().is_always());
        assert!(!Condition::new(ALWAYS, |_| true).is_always());
    }

    #[test]
    fn combinators_may_reference_programmatic_conditions() {
        let mut registry = ConditionRegistry::new();
        registry
            .register("has_docker", |p| p.contains("docker.version"))
            .expect("register");
        let mut specs = BTreeMap::new();
        specs.insert(
            "no_docker".to_string(),
            ConditionSpec::Not {
                condition: "has_docker".to_string(),
            },
        );
        registry.compile_specs(&specs).expect("compile");
        assert!(registry.get("no_docker").unwrap().evaluate(&Properties::new()));
    }

    #[test]
    fn unknown_references_and_cycles_fail_fast() {
        let mut specs = BTreeMap::new();
        specs.insert(
            "dangling".to_string(),
            ConditionSpec::Not {
                condition: "nowhere".to_string(),
            },
        );
        let err = ConditionRegistry::from_specs(&specs).unwrap_err();
        assert!(err.to_string().contains("nowhere"), "{}", err);

        let mut cyclic = BTreeMap::new();
        cyclic.insert(
            "a".to_string(),
            ConditionSpec::Not {
                condition: "b".to_string(),
            },
        );
        cyclic.insert(
            "b".to_string(),
            ConditionSpec::All {
                conditions: vec!["a".to_string()],
            },
        );
        let err = ConditionRegistry::from_specs(&cyclic).unwrap_err();
        assert!(err.to_string().contains("cycle"), "{}", err);
    }

    #[test]
    fn condition_spec_deserializes_from_toml() {
        let spec: ConditionSpec =
            toml::from_str("kind = \"equals\"\nproperty = \"os\"\nvalue = \"linux\"\n")
                .expect("parse");
        assert_eq!(spec, equals("os", "linux"));
    }
}
