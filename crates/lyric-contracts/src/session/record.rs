use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One of the three prompt/image positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
    C,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::A, Slot::B, Slot::C];

    pub fn suffix(self) -> &'static str {
        match self {
            Slot::A => "A",
            Slot::B => "B",
            Slot::C => "C",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
            Slot::C => 2,
        }
    }

    pub fn from_suffix(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Slot::A),
            "b" => Some(Slot::B),
            "c" => Some(Slot::C),
            _ => None,
        }
    }
}

/// Snapshot of pipeline state for one form submission.
///
/// Every field defaults to an empty string; a record deserialized from a
/// partial payload fills the gaps the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub raw_content: String,
    pub analysis_text: String,
    pub song_name: String,
    pub artist: String,
    pub prompt_a: String,
    pub prompt_b: String,
    pub prompt_c: String,
    pub image_a_path: String,
    pub image_b_path: String,
    pub image_c_path: String,
    pub analysis_model: String,
    pub prompt_model: String,
    pub image_model: String,
    pub error: Option<String>,
    pub created_at: String,
}

impl SessionRecord {
    pub fn stamped(mut self) -> Self {
        self.created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self
    }

    pub fn prompt(&self, slot: Slot) -> &str {
        match slot {
            Slot::A => &self.prompt_a,
            Slot::B => &self.prompt_b,
            Slot::C => &self.prompt_c,
        }
    }

    pub fn set_prompt(&mut self, slot: Slot, value: impl Into<String>) {
        let target = match slot {
            Slot::A => &mut self.prompt_a,
            Slot::B => &mut self.prompt_b,
            Slot::C => &mut self.prompt_c,
        };
        *target = value.into();
    }

    pub fn image_path(&self, slot: Slot) -> &str {
        match slot {
            Slot::A => &self.image_a_path,
            Slot::B => &self.image_b_path,
            Slot::C => &self.image_c_path,
        }
    }

    pub fn set_image_path(&mut self, slot: Slot, value: impl Into<String>) {
        let target = match slot {
            Slot::A => &mut self.image_a_path,
            Slot::B => &mut self.image_b_path,
            Slot::C => &mut self.image_c_path,
        };
        *target = value.into();
    }

    /// Fills slots A..C from `prompts` in order; missing entries clear the slot.
    pub fn assign_prompts(&mut self, prompts: &[String]) {
        for slot in Slot::ALL {
            let value = prompts.get(slot.index()).cloned().unwrap_or_default();
            self.set_prompt(slot, value);
        }
    }

    pub fn has_prompts(&self) -> bool {
        Slot::ALL.iter().any(|slot| !self.prompt(*slot).is_empty())
    }

    /// Non-empty prompts in slot order.
    pub fn prompts(&self) -> Vec<&str> {
        Slot::ALL
            .iter()
            .map(|slot| self.prompt(*slot))
            .filter(|prompt| !prompt.is_empty())
            .collect()
    }

    pub fn has_images(&self) -> bool {
        Slot::ALL.iter().any(|slot| !self.image_path(*slot).is_empty())
    }
}
