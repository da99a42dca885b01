// Runtime settings
//
// Layered with the `config` crate: built-in defaults, then an optional settings file
// (`wizard.toml` in the working directory, or an explicit `--settings` path), then `WIZARD_*`
// environment variables. Nested keys use `__`, e.g. `WIZARD_PROPERTIES__INSTALL.TYPE=custom`.

use crate::navigation::Properties;
use crate::spec::WizardSpec;
use crate::utils::os_detection::detect_os;
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "WIZARD";
const DEFAULT_SETTINGS_FILE: &str = "wizard";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Wizard spec file; the bundled demo spec is used when unset.
    pub spec: Option<PathBuf>,
    /// Log folder override.
    pub log_dir: Option<PathBuf>,
    /// Mirror log lines to stdout (ignored while the console UI owns the terminal).
    pub log_stdout: bool,
    /// Initial wizard properties, applied on top of the detected ones.
    pub properties: BTreeMap<String, String>,
}

impl WizardSettings {
    /// Load settings from the optional file and the process environment.
    pub fn load(settings_file: Option<&Path>) -> Result<Self> {
        Self::load_from(settings_file, None)
    }

    /// Same as `load`, with the environment replaced by `env` when given.
    pub fn load_from(
        settings_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let file = match settings_file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings = config::Config::builder()
            .set_default("log_stdout", false)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .context("Failed to load wizard settings")?;

        settings
            .try_deserialize()
            .context("Invalid wizard settings")
    }

    /// Properties the wizard starts with: the detected `os`, then configured values.
    pub fn seed_properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.set("os", detect_os().as_property());
        properties.extend(
            self.properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        properties
    }

    /// The configured spec file, or the bundled demo spec.
    pub fn load_spec(&self) -> Result<WizardSpec> {
        match &self.spec {
            Some(path) => {
                info!("[PHASE: config] [STEP: spec] Loading wizard spec {:?}", path);
                WizardSpec::load(path)
            }
            None => {
                info!("[PHASE: config] [STEP: spec] Using bundled demo spec");
                WizardSpec::demo()
            }
        }
    }
}
