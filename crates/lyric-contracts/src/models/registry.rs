use indexmap::IndexMap;

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_PROMPT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "nano-banana-2-4k";

/// Pipeline stage a model can be selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Analysis,
    Prompt,
    Image,
}

impl Stage {
    pub fn builtin_default(self) -> &'static str {
        match self {
            Stage::Analysis => DEFAULT_ANALYSIS_MODEL,
            Stage::Prompt => DEFAULT_PROMPT_MODEL,
            Stage::Image => DEFAULT_IMAGE_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl ModelSpec {
    pub fn supports(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Selectable models per stage, in display order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn by_stage(&self, stage: Stage) -> Vec<&ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(stage))
            .collect()
    }

    /// Option list for a stage: `preferred` first, then the registered
    /// models in order, without duplicates. `preferred` need not be
    /// registered.
    pub fn options(&self, stage: Stage, preferred: &str) -> Vec<String> {
        let mut out = Vec::new();
        let preferred = preferred.trim();
        if !preferred.is_empty() {
            out.push(preferred.to_string());
        }
        for model in self.by_stage(stage) {
            if !out.iter().any(|existing| existing == &model.name) {
                out.push(model.name.clone());
            }
        }
        out
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map: IndexMap<String, ModelSpec> = IndexMap::new();

    let mut insert = |name: &str, stage: Stage| {
        map.entry(name.to_string())
            .or_insert_with(|| ModelSpec {
                name: name.to_string(),
                stages: Vec::new(),
            })
            .stages
            .push(stage);
    };

    for name in [
        "gemini-3-pro-preview",
        "gemini-3-pro-preview-thinking-*",
        "gemini-3-flash-preview",
        "gemini-3-flash-preview-nothinking",
        "gemini-3-flash-preview-thinking-*",
        "gemini-2.5-pro",
        "gemini-2.0-pro",
    ] {
        insert(name, Stage::Analysis);
    }
    for name in [
        "gemini-3-flash-preview",
        "gemini-3-flash-preview-nothinking",
        "gemini-3-flash-preview-thinking-*",
        "gemini-2.5-flash",
        "gemini-2.0-flash",
        "gemini-1.5-flash",
    ] {
        insert(name, Stage::Prompt);
    }
    for name in [
        "nano-banana-2-4k",
        "nano-banana-2",
        "nano-banana-2-2k",
        "gemini-3-pro-image-preview",
    ] {
        insert(name, Stage::Image);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_lead_their_stage() {
        let registry = ModelRegistry::default();
        for stage in [Stage::Analysis, Stage::Prompt, Stage::Image] {
            let options = registry.options(stage, stage.builtin_default());
            assert_eq!(options.first().map(String::as_str), Some(stage.builtin_default()));
        }
    }

    #[test]
    fn shared_models_serve_several_stages() {
        let registry = ModelRegistry::default();
        let flash = registry.get("gemini-3-flash-preview");
        assert!(flash.is_some_and(|spec| spec.supports(Stage::Analysis)));
        assert!(flash.is_some_and(|spec| spec.supports(Stage::Prompt)));
        assert!(flash.is_some_and(|spec| !spec.supports(Stage::Image)));
    }

    #[test]
    fn options_put_custom_default_first_without_duplicates() {
        let registry = ModelRegistry::default();
        let options = registry.options(Stage::Image, "nano-banana-2");
        assert_eq!(
            options,
            vec![
                "nano-banana-2",
                "nano-banana-2-4k",
                "nano-banana-2-2k",
                "gemini-3-pro-image-preview",
            ]
        );

        let options = registry.options(Stage::Prompt, "my-local-model");
        assert_eq!(options[0], "my-local-model");
        assert_eq!(options.len(), 7);
    }

    #[test]
    fn blank_preferred_is_skipped() {
        let registry = ModelRegistry::default();
        let options = registry.options(Stage::Analysis, "  ");
        assert_eq!(options.len(), 7);
        assert_eq!(options[0], DEFAULT_ANALYSIS_MODEL);
    }
}
