use crate::navigation::{Step, StepContext, StepDecl, StepInput, StepView};
use crate::utils::logging::mask_sensitive;
use log::info;
use regex::Regex;

/// Single-line text buffer. Masked buffers render as `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    masked: bool,
}

impl TextInput {
    pub fn new(value: impl Into<String>, masked: bool) -> Self {
        Self {
            value: value.into(),
            masked,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns true when the input changed the buffer.
    pub fn handle_input(&mut self, input: StepInput) -> bool {
        match input {
            StepInput::Char(c) if !c.is_control() => {
                self.value.push(c);
                true
            }
            StepInput::Backspace => self.value.pop().is_some(),
            _ => false,
        }
    }
}

/// Text field bound to a property. Optional `pattern` (regex) must match the trimmed value.
pub struct InputStep {
    name: String,
    title: String,
    label: String,
    property: String,
    default: String,
    required: bool,
    pattern: Option<Regex>,
    input: TextInput,
}

impl InputStep {
    pub fn from_decl(decl: &StepDecl) -> Result<Self, String> {
        let pattern = match decl.property("pattern") {
            Some(p) => Some(Regex::new(p).map_err(|e| format!("invalid pattern '{}': {}", p, e))?),
            None => None,
        };
        let masked = decl.flag("masked", false);
        Ok(Self {
            name: decl.name.clone(),
            title: super::title_of(decl),
            label: decl.property("label").unwrap_or("Value").to_string(),
            property: decl.property("property").unwrap_or(&decl.name).to_string(),
            default: decl.property("default").unwrap_or_default().to_string(),
            required: decl.flag("required", true),
            pattern,
            input: TextInput::new("", masked),
        })
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }
}

impl Step for InputStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        let value = self.input.value().trim();
        if value.is_empty() {
            return !self.required;
        }
        self.pattern
            .as_ref()
            .map(|re| re.is_match(value))
            .unwrap_or(true)
    }

    fn prepare(&mut self, ctx: &mut StepContext) {
        let current = ctx
            .properties
            .get(&self.property)
            .unwrap_or(&self.default)
            .to_string();
        self.input.set(current);
    }

    fn proceed(&mut self, ctx: &mut StepContext) -> bool {
        if !self.is_valid() {
            return false;
        }
        let value = self.input.value().trim().to_string();
        let logged = if self.input.masked {
            mask_sensitive(&value)
        } else {
            value.clone()
        };
        info!(
            "[PHASE: wizard] [STEP: {}] {} = {}",
            self.name, self.property, logged
        );
        ctx.properties.set(self.property.clone(), value);
        true
    }

    fn handle_input(&mut self, input: StepInput, _ctx: &mut StepContext) {
        self.input.handle_input(input);
    }

    fn view(&self, _ctx: &StepContext) -> StepView {
        let mut lines = vec![format!("{}: {}_", self.label, self.input.display())];
        if !self.is_valid() {
            lines.push(String::new());
            lines.push(if self.input.value().trim().is_empty() {
                "A value is required.".to_string()
            } else {
                "The value is not in the expected format.".to_string()
            });
        }
        StepView {
            title: self.title.clone(),
            lines,
        }
    }
}
