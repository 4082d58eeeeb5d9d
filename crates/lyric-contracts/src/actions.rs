use crate::session::Slot;

/// Form action submitted with the page's buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Analyze,
    GeneratePrompts,
    GenerateImages,
    Regenerate(Slot),
    Unknown(String),
}

impl Action {
    /// A missing or blank value means `analyze`.
    pub fn from_form(raw: Option<&str>) -> Self {
        let value = raw.map(str::trim).unwrap_or_default();
        match value {
            "" | "analyze" => Action::Analyze,
            "generate_prompts" => Action::GeneratePrompts,
            "generate_images" => Action::GenerateImages,
            other => match other.strip_prefix("regenerate_").and_then(Slot::from_suffix) {
                Some(slot) => Action::Regenerate(slot),
                None => Action::Unknown(other.to_string()),
            },
        }
    }

    pub fn name(&self) -> String {
        match self {
            Action::Analyze => "analyze".to_string(),
            Action::GeneratePrompts => "generate_prompts".to_string(),
            Action::GenerateImages => "generate_images".to_string(),
            Action::Regenerate(slot) => {
                format!("regenerate_{}", slot.suffix().to_ascii_lowercase())
            }
            Action::Unknown(raw) => raw.clone(),
        }
    }

    /// Slots an image action writes to.
    pub fn image_slots(&self) -> Vec<Slot> {
        match self {
            Action::GenerateImages => Slot::ALL.to_vec(),
            Action::Regenerate(slot) => vec![*slot],
            _ => Vec::new(),
        }
    }
}
