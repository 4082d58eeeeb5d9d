mod agent;
mod config;
pub mod prompts;
pub mod providers;

pub use agent::{
    cover_file_name, GeneratedImage, LyricsAgent, PipelineImage, PipelineResult, RetryPolicy,
    IMAGE_SIZE,
};
pub use config::{AgentConfig, StageModels};
pub use providers::ProviderKind;

/// Joins an error's cause chain into one line, skipping repeats.
pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts.last().is_some_and(|existing| existing == trimmed) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
