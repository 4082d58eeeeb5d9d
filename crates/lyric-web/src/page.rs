use anyhow::{Context as _, Result};
use lyric_contracts::models::{ModelRegistry, Stage};
use lyric_contracts::session::{SessionRecord, Slot};
use serde::Serialize;
use tera::{Context, Tera};

const INDEX_TEMPLATE: &str = "index.html";

pub const DISCLAIMER: &str = "本段落中所使用的歌词，其著作权属于原著作权人，仅以介绍为目的引用。";

#[derive(Debug, Serialize)]
struct ImageCard<'a> {
    slot: &'static str,
    prompt: &'a str,
    image_path: &'a str,
}

/// Tera renderer for the single index page. Autoescaping is on because the
/// template name ends in `.html`.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))
            .context("index template failed to parse")?;
        Ok(Self { tera })
    }

    pub fn render(&self, record: &SessionRecord, registry: &ModelRegistry) -> Result<String> {
        let mut context = Context::new();
        context.insert("record", record);
        context.insert("error", &record.error);
        context.insert("disclaimer", DISCLAIMER);

        let prompts = record.prompts();
        context.insert("prompts", &prompts);

        let images: Vec<ImageCard<'_>> = if record.has_images() {
            Slot::ALL
                .iter()
                .map(|slot| ImageCard {
                    slot: slot.suffix(),
                    prompt: record.prompt(*slot),
                    image_path: record.image_path(*slot),
                })
                .collect()
        } else {
            Vec::new()
        };
        context.insert("images", &images);

        context.insert(
            "analysis_models",
            &registry.options(Stage::Analysis, &record.analysis_model),
        );
        context.insert(
            "prompt_models",
            &registry.options(Stage::Prompt, &record.prompt_model),
        );
        context.insert(
            "image_models",
            &registry.options(Stage::Image, &record.image_model),
        );

        self.tera
            .render(INDEX_TEMPLATE, &context)
            .context("index template failed to render")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> SessionRecord {
        SessionRecord {
            analysis_model: "gemini-3-pro-preview".to_string(),
            prompt_model: "gemini-3-flash-preview".to_string(),
            image_model: "nano-banana-2-4k".to_string(),
            ..SessionRecord::default()
        }
    }

    #[test]
    fn empty_record_renders_form_without_results() -> anyhow::Result<()> {
        let html = PageRenderer::new()?.render(&base_record(), &ModelRegistry::default())?;
        assert!(html.contains(r#"name="raw_content""#));
        assert!(html.contains(r#"value="gemini-2.0-pro""#));
        assert!(!html.contains(DISCLAIMER));
        assert!(!html.contains(r#"class="error""#));
        Ok(())
    }

    #[test]
    fn user_text_is_escaped() -> anyhow::Result<()> {
        let record = SessionRecord {
            raw_content: "<script>alert(1)</script>".to_string(),
            error: Some("生成失败: <b>".to_string()),
            ..base_record()
        };
        let html = PageRenderer::new()?.render(&record, &ModelRegistry::default())?;
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("生成失败: &lt;b&gt;"));
        Ok(())
    }

    #[test]
    fn images_show_all_slots_with_disclaimer() -> anyhow::Result<()> {
        let mut record = base_record();
        record.assign_prompts(&["paper".to_string(), "glow".to_string()]);
        record.set_image_path(Slot::B, "outputs/x_cover_B.png");
        let html = PageRenderer::new()?.render(&record, &ModelRegistry::default())?;
        assert!(html.contains(DISCLAIMER));
        // tera escapes `/` as `&#x2F;` inside attributes
        assert!(html.contains(r#"src="/outputs&#x2F;x_cover_B.png""#));
        assert!(html.contains(r#"name="image_b_path" value="outputs&#x2F;x_cover_B.png""#));
        Ok(())
    }

    #[test]
    fn selected_model_is_marked() -> anyhow::Result<()> {
        let record = SessionRecord {
            image_model: "custom-image".to_string(),
            ..base_record()
        };
        let html = PageRenderer::new()?.render(&record, &ModelRegistry::default())?;
        assert!(html.contains(r#"<option value="custom-image" selected>"#));
        Ok(())
    }
}
