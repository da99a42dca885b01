use crate::navigation::{Step, StepContext, StepDecl, StepInput, StepView};
use log::info;

/// License acceptance. Space toggles acceptance; the step is valid only once accepted.
pub struct LicenseStep {
    name: String,
    title: String,
    text: String,
    property: String,
    accepted: bool,
}

impl LicenseStep {
    pub fn from_decl(decl: &StepDecl) -> Self {
        Self {
            name: decl.name.clone(),
            title: super::title_of(decl),
            text: decl.property("text").unwrap_or_default().to_string(),
            property: decl
                .property("property")
                .unwrap_or("license.accepted")
                .to_string(),
            accepted: false,
        }
    }
}

impl Step for LicenseStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        self.accepted
    }

    fn prepare(&mut self, ctx: &mut StepContext) {
        self.accepted = ctx.properties.is_true(&self.property);
    }

    fn proceed(&mut self, ctx: &mut StepContext) -> bool {
        if !self.accepted {
            return false;
        }
        ctx.properties.set(self.property.clone(), "true");
        info!(
            "[PHASE: wizard] [STEP: {}] License accepted (session {})",
            self.name,
            ctx.session_id()
        );
        true
    }

    fn handle_input(&mut self, input: StepInput, _ctx: &mut StepContext) {
        if input == StepInput::Char(' ') {
            self.accepted = !self.accepted;
        }
    }

    fn view(&self, _ctx: &StepContext) -> StepView {
        let mut lines: Vec<String> = self.text.lines().map(str::to_string).collect();
        lines.push(String::new());
        let mark = if self.accepted { "x" } else { " " };
        lines.push(format!("[{}] I accept the license terms (Space to toggle)", mark));
        StepView {
            title: self.title.clone(),
            lines,
        }
    }
}
