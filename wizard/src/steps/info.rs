use crate::navigation::{Step, StepContext, StepDecl, StepView};

/// Static text page (welcome, notes). Always valid.
pub struct InfoStep {
    name: String,
    title: String,
    text: String,
}

impl InfoStep {
    pub fn from_decl(decl: &StepDecl) -> Self {
        Self {
            name: decl.name.clone(),
            title: super::title_of(decl),
            text: decl.property("text").unwrap_or_default().to_string(),
        }
    }
}

impl Step for InfoStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn view(&self, _ctx: &StepContext) -> StepView {
        StepView {
            title: self.title.clone(),
            lines: self.text.lines().map(str::to_string).collect(),
        }
    }
}
