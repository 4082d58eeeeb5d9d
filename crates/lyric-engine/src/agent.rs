use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use lyric_contracts::analysis::{
    or_unknown_artist, or_unknown_song, parse_analysis_response, safe_filename, split_prompts,
    ParsedAnalysis,
};
use lyric_contracts::session::Slot;

use crate::config::{AgentConfig, StageModels};
use crate::prompts::{
    analysis_user_message, visual_prompt_user_message, ANALYSIS_SYSTEM_PROMPT,
    VISUAL_PROMPT_SYSTEM_PROMPT,
};
use crate::providers::{
    build_providers, ChatPurpose, ChatRequest, ImageProvider, ImageRequest, ProviderKind,
    TextProvider,
};
use crate::{error_chain_text, truncate_text};

pub const IMAGE_SIZE: &str = "1024x1024";
const PROMPT_LOG_CHARS: usize = 100;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff_s: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_attempts: config.image_max_retries,
            backoff_s: config.image_retry_backoff_s,
        }
    }

    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Delay after failed attempt `attempt` (1-based), capped at one hour.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let seconds = (self.backoff_s * attempt as f64).max(0.0);
        Duration::try_from_secs_f64(seconds)
            .map(|delay| delay.min(MAX_RETRY_DELAY))
            .unwrap_or(MAX_RETRY_DELAY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub source_url: Option<String>,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineImage {
    pub slot: Slot,
    pub prompt: String,
    pub path: PathBuf,
    pub source_url: Option<String>,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub post: String,
    pub song_name: String,
    pub artist: String,
    pub visual_prompt: String,
    pub images: Vec<PipelineImage>,
}

/// Runs the three pipeline stages against a text and an image provider.
///
/// Calls block; callers on an async runtime must move them to a blocking
/// thread.
#[derive(Clone)]
pub struct LyricsAgent {
    text: Arc<dyn TextProvider>,
    images: Arc<dyn ImageProvider>,
    defaults: StageModels,
    retry: RetryPolicy,
    sleeper: Sleeper,
}

impl LyricsAgent {
    pub fn new(
        text: Arc<dyn TextProvider>,
        images: Arc<dyn ImageProvider>,
        defaults: StageModels,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            text,
            images,
            defaults,
            retry,
            sleeper: Arc::new(thread::sleep),
        }
    }

    pub fn from_config(config: &AgentConfig, kind: ProviderKind) -> Result<Self> {
        let (text, images) = build_providers(kind, config)?;
        Ok(Self::new(
            text,
            images,
            config.models.clone(),
            RetryPolicy::from_config(config),
        ))
    }

    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn defaults(&self) -> &StageModels {
        &self.defaults
    }

    pub fn provider_name(&self) -> &str {
        self.text.name()
    }

    /// Returns the raw analysis response, metadata block included.
    pub fn analyze(&self, raw_content: &str, model: Option<&str>) -> Result<String> {
        let model = pick_model(model, &self.defaults.analysis);
        tracing::info!(model, provider = self.text.name(), "analyzing lyrics");
        self.text
            .complete(&ChatRequest {
                purpose: ChatPurpose::Analysis,
                model: model.to_string(),
                system: ANALYSIS_SYSTEM_PROMPT.to_string(),
                user: analysis_user_message(raw_content),
            })
            .context("analysis request failed")
    }

    /// Analyzes and splits the response; a missing metadata block is logged
    /// and replaced by the unknown defaults.
    pub fn analyze_parsed(&self, raw_content: &str, model: Option<&str>) -> Result<ParsedAnalysis> {
        let full_response = self.analyze(raw_content, model)?;
        let parsed = parse_analysis_response(&full_response);
        if !parsed.has_metadata {
            tracing::warn!("analysis response had no metadata block; using default title and artist");
        }
        Ok(parsed)
    }

    pub fn generate_visual_prompt(
        &self,
        song_name: &str,
        artist: &str,
        analysis: &str,
        model: Option<&str>,
    ) -> Result<String> {
        let model = pick_model(model, &self.defaults.prompt);
        tracing::info!(model, song_name, "generating card prompts");
        self.text
            .complete(&ChatRequest {
                purpose: ChatPurpose::VisualPrompt,
                model: model.to_string(),
                system: VISUAL_PROMPT_SYSTEM_PROMPT.to_string(),
                user: visual_prompt_user_message(song_name, artist, analysis),
            })
            .context("prompt generation request failed")
    }

    /// Generates one image and writes it to `path`.
    ///
    /// Makes up to `retry.attempts()` attempts, sleeping `backoff * k` after
    /// failed attempt `k`. Returns `None` once every attempt failed.
    pub fn generate_image(
        &self,
        prompt: &str,
        path: &Path,
        model: Option<&str>,
    ) -> Option<GeneratedImage> {
        let model = pick_model(model, &self.defaults.image);
        let attempts = self.retry.attempts();
        tracing::info!(
            model,
            prompt = %truncate_text(prompt, PROMPT_LOG_CHARS),
            "generating image"
        );

        for attempt in 1..=attempts {
            match self.try_generate_image(prompt, path, model) {
                Ok(source_url) => {
                    tracing::info!(path = %path.display(), attempt, "image saved");
                    return Some(GeneratedImage {
                        path: path.to_path_buf(),
                        source_url,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        error = %error_chain_text(&err, 512),
                        "image generation failed"
                    );
                    if attempt < attempts {
                        (self.sleeper)(self.retry.delay_after(attempt));
                    }
                }
            }
        }

        None
    }

    fn try_generate_image(&self, prompt: &str, path: &Path, model: &str) -> Result<Option<String>> {
        let generated = self.images.generate(&ImageRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            size: IMAGE_SIZE.to_string(),
        })?;
        if generated.bytes.is_empty() {
            bail!("image response was empty");
        }
        image::guess_format(&generated.bytes).with_context(|| {
            format!(
                "downloaded payload is not an image (content-type {})",
                generated.mime_type.as_deref().unwrap_or("unknown")
            )
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, &generated.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(generated.source_url)
    }

    /// Analysis, prompts and up to three images in one go.
    pub fn run_pipeline(
        &self,
        raw_content: &str,
        output_dir: Option<&Path>,
        models: &StageModels,
    ) -> Result<PipelineResult> {
        let parsed = self.analyze_parsed(raw_content, Some(&models.analysis))?;
        let song_name = or_unknown_song(&parsed.song_name);
        let artist = or_unknown_artist(&parsed.artist);

        let visual_prompt =
            self.generate_visual_prompt(&song_name, &artist, &parsed.post, Some(&models.prompt))?;

        if let Some(dir) = output_dir {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let stem = safe_filename(&song_name);
        let mut images = Vec::new();
        for (slot, prompt) in Slot::ALL.into_iter().zip(split_prompts(&visual_prompt)) {
            let file_name = cover_file_name(&stem, slot);
            let path = match output_dir {
                Some(dir) => dir.join(&file_name),
                None => PathBuf::from(&file_name),
            };
            let generated = self.generate_image(&prompt, &path, Some(&models.image));
            images.push(PipelineImage {
                slot,
                prompt,
                path,
                saved: generated.is_some(),
                source_url: generated.and_then(|image| image.source_url),
            });
        }

        Ok(PipelineResult {
            post: parsed.post,
            song_name,
            artist,
            visual_prompt,
            images,
        })
    }
}

/// `<stem>_cover_<slot>.png`
pub fn cover_file_name(stem: &str, slot: Slot) -> String {
    format!("{stem}_cover_{}.png", slot.suffix())
}

fn pick_model<'a>(requested: Option<&'a str>, default: &'a str) -> &'a str {
    requested
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}
