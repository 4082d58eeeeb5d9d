use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use lyric_contracts::actions::Action;
use lyric_contracts::analysis::{or_unknown_artist, or_unknown_song, prompt_lines, safe_filename};
use lyric_contracts::session::SessionRecord;
use lyric_engine::{cover_file_name, error_chain_text, LyricsAgent};

pub const MISSING_INPUT: &str = "请输入歌曲信息（歌名/歌手/歌词）。";
pub const NEED_ANALYSIS: &str = "请先进行歌词赏析。";
pub const NEED_PROMPTS: &str = "请先生成或填写提示词。";
pub const FAILURE_PREFIX: &str = "生成失败: ";

/// Web path prefix of generated images, relative to the site root.
pub const OUTPUTS_PREFIX: &str = "outputs";

/// Applies one form action to `record` and returns it with either the new
/// fields or a user-facing error. Blocks on network I/O.
pub fn dispatch(
    agent: &LyricsAgent,
    output_dir: &Path,
    action: &Action,
    mut record: SessionRecord,
) -> SessionRecord {
    if record.raw_content.is_empty() {
        record.error = Some(MISSING_INPUT.to_string());
        return record;
    }

    if let Err(err) = apply(agent, output_dir, action, &mut record) {
        tracing::warn!(action = %action.name(), error = %error_chain_text(&err, 512), "action failed");
        record.error = Some(format!("{FAILURE_PREFIX}{}", error_chain_text(&err, 512)));
    }
    record
}

fn apply(
    agent: &LyricsAgent,
    output_dir: &Path,
    action: &Action,
    record: &mut SessionRecord,
) -> Result<()> {
    match action {
        Action::Analyze => {
            let parsed = agent.analyze_parsed(&record.raw_content, Some(&record.analysis_model))?;
            record.analysis_text = parsed.post;
            record.song_name = parsed.song_name;
            record.artist = parsed.artist;
        }
        Action::GeneratePrompts => {
            if record.analysis_text.is_empty() {
                bail!(NEED_ANALYSIS);
            }
            record.song_name = or_unknown_song(&record.song_name);
            record.artist = or_unknown_artist(&record.artist);
            let raw = agent.generate_visual_prompt(
                &record.song_name,
                &record.artist,
                &record.analysis_text,
                Some(&record.prompt_model),
            )?;
            record.assign_prompts(&prompt_lines(&raw));
        }
        Action::GenerateImages | Action::Regenerate(_) => {
            if !record.has_prompts() {
                bail!(NEED_PROMPTS);
            }
            fs::create_dir_all(output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;
            let stem = safe_filename(&record.song_name);
            for slot in action.image_slots() {
                let prompt = record.prompt(slot).to_string();
                if prompt.is_empty() {
                    continue;
                }
                let file_name = cover_file_name(&stem, slot);
                let saved = agent.generate_image(
                    &prompt,
                    &output_dir.join(&file_name),
                    Some(&record.image_model),
                );
                let web_path = match saved {
                    Some(_) => format!("{OUTPUTS_PREFIX}/{file_name}"),
                    None => String::new(),
                };
                record.set_image_path(slot, web_path);
            }
        }
        Action::Unknown(name) => {
            tracing::warn!(action = %name, "ignoring unknown action");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use lyric_contracts::session::Slot;
    use lyric_engine::providers::{
        DryrunProvider, ImageBytes, ImageProvider, ImageRequest,
    };
    use lyric_engine::{RetryPolicy, StageModels};

    use super::*;

    struct BrokenImages;

    impl ImageProvider for BrokenImages {
        fn name(&self) -> &str {
            "broken"
        }

        fn generate(&self, _request: &ImageRequest) -> Result<ImageBytes> {
            Err(anyhow!("upstream 503"))
        }
    }

    fn agent(images: Arc<dyn ImageProvider>) -> LyricsAgent {
        LyricsAgent::new(
            Arc::new(DryrunProvider),
            images,
            StageModels::default(),
            RetryPolicy {
                max_attempts: 2,
                backoff_s: 0.0,
            },
        )
    }

    fn record(raw: &str) -> SessionRecord {
        SessionRecord {
            raw_content: raw.to_string(),
            ..SessionRecord::default()
        }
    }

    #[test]
    fn empty_input_is_rejected_before_any_call() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out = dispatch(
            &agent(Arc::new(BrokenImages)),
            temp.path(),
            &Action::Analyze,
            record(""),
        );
        assert_eq!(out.error.as_deref(), Some(MISSING_INPUT));
        assert_eq!(out.analysis_text, "");
        Ok(())
    }

    #[test]
    fn analyze_fills_post_title_and_artist() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out = dispatch(
            &agent(Arc::new(DryrunProvider)),
            temp.path(),
            &Action::Analyze,
            record("晴天"),
        );
        assert_eq!(out.error, None);
        assert!(out.analysis_text.contains("dryrun"));
        assert!(out.song_name.starts_with("Dryrun Song"));
        assert_eq!(out.artist, "Dryrun Artist");
        Ok(())
    }

    #[test]
    fn prompts_require_analysis() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out = dispatch(
            &agent(Arc::new(DryrunProvider)),
            temp.path(),
            &Action::GeneratePrompts,
            record("晴天"),
        );
        assert_eq!(out.error, Some(format!("{FAILURE_PREFIX}{NEED_ANALYSIS}")));
        Ok(())
    }

    #[test]
    fn prompts_default_title_and_artist() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut input = record("晴天");
        input.analysis_text = "post".to_string();
        let out = dispatch(
            &agent(Arc::new(DryrunProvider)),
            temp.path(),
            &Action::GeneratePrompts,
            input,
        );
        assert_eq!(out.error, None);
        assert_eq!(out.song_name, "Unknown_Song");
        assert_eq!(out.artist, "Unknown_Artist");
        assert_eq!(out.prompts().len(), 3);
        Ok(())
    }

    #[test]
    fn images_require_a_prompt() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out = dispatch(
            &agent(Arc::new(DryrunProvider)),
            temp.path(),
            &Action::GenerateImages,
            record("晴天"),
        );
        assert_eq!(out.error, Some(format!("{FAILURE_PREFIX}{NEED_PROMPTS}")));
        Ok(())
    }

    #[test]
    fn generate_images_skips_empty_slots() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut input = record("晴天");
        input.song_name = "Sunny Day".to_string();
        input.set_prompt(Slot::A, "paper");
        input.set_prompt(Slot::C, "object");
        let out = dispatch(
            &agent(Arc::new(DryrunProvider)),
            temp.path(),
            &Action::GenerateImages,
            input,
        );
        assert_eq!(out.error, None);
        assert_eq!(out.image_path(Slot::A), "outputs/Sunny Day_cover_A.png");
        assert_eq!(out.image_path(Slot::B), "");
        assert_eq!(out.image_path(Slot::C), "outputs/Sunny Day_cover_C.png");
        assert!(temp.path().join("Sunny Day_cover_C.png").exists());
        Ok(())
    }

    #[test]
    fn regenerate_touches_only_its_slot() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut input = record("晴天");
        input.assign_prompts(&["a".to_string(), "b".to_string(), "c".to_string()]);
        input.set_image_path(Slot::A, "outputs/old_A.png");
        let out = dispatch(
            &agent(Arc::new(DryrunProvider)),
            temp.path(),
            &Action::Regenerate(Slot::B),
            input,
        );
        assert_eq!(out.image_path(Slot::A), "outputs/old_A.png");
        assert_eq!(out.image_path(Slot::B), "outputs/cover_image_cover_B.png");
        assert_eq!(out.image_path(Slot::C), "");
        Ok(())
    }

    #[test]
    fn failed_images_clear_the_slot_silently() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut input = record("晴天");
        input.set_prompt(Slot::A, "paper");
        input.set_image_path(Slot::A, "outputs/stale.png");
        let out = dispatch(
            &agent(Arc::new(BrokenImages)),
            temp.path(),
            &Action::Regenerate(Slot::A),
            input,
        );
        assert_eq!(out.error, None);
        assert_eq!(out.image_path(Slot::A), "");
        Ok(())
    }

    #[test]
    fn unknown_action_keeps_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut input = record("晴天");
        input.song_name = "keep".to_string();
        let out = dispatch(
            &agent(Arc::new(BrokenImages)),
            temp.path(),
            &Action::Unknown("publish".to_string()),
            input.clone(),
        );
        assert_eq!(out, input);
        Ok(())
    }
}
