use lyric_contracts::actions::Action;
use lyric_contracts::session::SessionRecord;
use lyric_engine::StageModels;
use serde::Deserialize;

/// Fields posted by the index page. Everything is optional; absent text
/// fields become empty strings and absent models fall back to the stage
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexForm {
    pub action: Option<String>,
    pub raw_content: Option<String>,
    pub analysis_model: Option<String>,
    pub prompt_model: Option<String>,
    pub image_model: Option<String>,
    pub analysis_text: Option<String>,
    pub song_name: Option<String>,
    pub artist: Option<String>,
    pub prompt_a: Option<String>,
    pub prompt_b: Option<String>,
    pub prompt_c: Option<String>,
    pub image_a_path: Option<String>,
    pub image_b_path: Option<String>,
    pub image_c_path: Option<String>,
}

impl IndexForm {
    pub fn action(&self) -> Action {
        Action::from_form(self.action.as_deref())
    }

    pub fn into_record(self, defaults: &StageModels) -> SessionRecord {
        SessionRecord {
            raw_content: trimmed(self.raw_content),
            analysis_text: trimmed(self.analysis_text),
            song_name: trimmed(self.song_name),
            artist: trimmed(self.artist),
            prompt_a: trimmed(self.prompt_a),
            prompt_b: trimmed(self.prompt_b),
            prompt_c: trimmed(self.prompt_c),
            image_a_path: trimmed(self.image_a_path),
            image_b_path: trimmed(self.image_b_path),
            image_c_path: trimmed(self.image_c_path),
            analysis_model: model_or(self.analysis_model, &defaults.analysis),
            prompt_model: model_or(self.prompt_model, &defaults.prompt),
            image_model: model_or(self.image_model, &defaults.image),
            error: None,
            created_at: String::new(),
        }
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|value| value.trim().to_string()).unwrap_or_default()
}

fn model_or(value: Option<String>, default: &str) -> String {
    let value = trimmed(value);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
