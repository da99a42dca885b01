use crate::navigation::{Step, StepContext, StepDecl, StepInput, StepView};
use log::info;

/// Pick one of `options` (Up/Down) and write it to `property`.
pub struct ChoiceStep {
    name: String,
    title: String,
    property: String,
    options: Vec<String>,
    default: Option<String>,
    selected: usize,
}

impl ChoiceStep {
    pub fn from_decl(decl: &StepDecl) -> Result<Self, String> {
        let options = super::list_of(decl, "options");
        if options.is_empty() {
            return Err("choice step needs at least one entry in 'options'".to_string());
        }
        let default = decl.property("default").map(str::to_string);
        if let Some(d) = &default {
            if !options.contains(d) {
                return Err(format!("default '{}' is not one of the options", d));
            }
        }
        Ok(Self {
            name: decl.name.clone(),
            title: super::title_of(decl),
            property: decl.property("property").unwrap_or(&decl.name).to_string(),
            options,
            default,
            selected: 0,
        })
    }

    pub fn selected(&self) -> &str {
        &self.options[self.selected]
    }

    fn index_of(&self, value: &str) -> Option<usize> {
        self.options.iter().position(|o| o == value)
    }
}

impl Step for ChoiceStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn prepare(&mut self, ctx: &mut StepContext) {
        self.selected = ctx
            .properties
            .get(&self.property)
            .and_then(|v| self.index_of(v))
            .or_else(|| self.default.as_deref().and_then(|d| self.index_of(d)))
            .unwrap_or(0);
    }

    fn proceed(&mut self, ctx: &mut StepContext) -> bool {
        let value = self.selected().to_string();
        info!(
            "[PHASE: wizard] [STEP: {}] {} = {}",
            self.name, self.property, value
        );
        ctx.properties.set(self.property.clone(), value);
        true
    }

    fn handle_input(&mut self, input: StepInput, _ctx: &mut StepContext) {
        let count = self.options.len();
        match input {
            StepInput::Down => self.selected = (self.selected + 1) % count,
            StepInput::Up => self.selected = (self.selected + count - 1) % count,
            _ => {}
        }
    }

    fn view(&self, _ctx: &StepContext) -> StepView {
        let lines = self
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let mark = if i == self.selected { "(*)" } else { "( )" };
                format!("{} {}", mark, o)
            })
            .collect();
        StepView {
            title: self.title.clone(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl() -> StepDecl {
        StepDecl::new("install_type", "choice")
            .with_property("property", "install.type")
            .with_property("options", "typical,custom,minimal")
            .with_property("default", "custom")
    }

    #[test]
    fn cycles_options_and_writes_property() {
        let mut ctx = StepContext::default();
        let mut step = ChoiceStep::from_decl(&decl()).expect("step");
        step.prepare(&mut ctx);
        assert_eq!(step.selected(), "custom");

        step.handle_input(StepInput::Down, &mut ctx);
        assert_eq!(step.selected(), "minimal");
        step.handle_input(StepInput::Down, &mut ctx);
        assert_eq!(step.selected(), "typical");
        step.handle_input(StepInput::Up, &mut ctx);
        assert_eq!(step.selected(), "minimal");

        assert!(step.proceed(&mut ctx));
        assert_eq!(ctx.properties.get("install.type"), Some("minimal"));
        assert_eq!(step.view(&ctx).lines[2], "(*) minimal");
    }

    #[test]
    fn prepare_restores_previous_answer() {
        let mut ctx = StepContext::default();
        ctx.properties.set("install.type", "typical");
        let mut step = ChoiceStep::from_decl(&decl()).expect("step");
        step.prepare(&mut ctx);
        assert_eq!(step.selected(), "typical");
    }

    #[test]
    fn rejects_missing_options_or_unknown_default() {
        assert!(ChoiceStep::from_decl(&StepDecl::new("c", "choice")).is_err());
        let bad = StepDecl::new("c", "choice")
            .with_property("options", "a,b")
            .with_property("default", "z");
        assert!(ChoiceStep::from_decl(&bad).is_err());
    }
}
