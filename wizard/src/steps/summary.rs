use crate::navigation::{Step, StepContext, StepDecl, StepView};
use crate::utils::logging::mask_sensitive;

/// Read-only recap of collected properties. Cancel is disabled here.
pub struct SummaryStep {
    name: String,
    title: String,
    keys: Vec<String>,
    masked: Vec<String>,
    allow_previous: bool,
}

impl SummaryStep {
    pub fn from_decl(decl: &StepDecl) -> Self {
        Self {
            name: decl.name.clone(),
            title: super::title_of(decl),
            keys: super::list_of(decl, "keys"),
            masked: super::list_of(decl, "masked"),
            allow_previous: decl.flag("allow_previous", true),
        }
    }
}

impl Step for SummaryStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn allow_previous(&self) -> bool {
        self.allow_previous
    }

    fn allow_cancel(&self) -> bool {
        false
    }

    fn view(&self, ctx: &StepContext) -> StepView {
        let shown: Vec<(&str, &str)> = if self.keys.is_empty() {
            ctx.properties.iter().collect()
        } else {
            self.keys
                .iter()
                .filter_map(|k| ctx.properties.get(k).map(|v| (k.as_str(), v)))
                .collect()
        };
        let lines = shown
            .into_iter()
            .map(|(k, v)| {
                if self.masked.iter().any(|m| m == k) {
                    format!("{}: {}", k, mask_sensitive(v))
                } else {
                    format!("{}: {}", k, v)
                }
            })
            .collect();
        StepView {
            title: self.title.clone(),
            lines,
        }
    }
}
