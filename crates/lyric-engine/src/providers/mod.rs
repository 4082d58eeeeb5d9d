mod dryrun;
mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::config::AgentConfig;

pub use dryrun::DryrunProvider;
pub use openai::OpenAiCompatProvider;

/// Which stage a chat completion serves; used for logging and by the dryrun
/// stand-in to pick a canned reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPurpose {
    Analysis,
    VisualPrompt,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub purpose: ChatPurpose,
    pub model: String,
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
}

#[derive(Debug, Clone)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
    /// Remote URL the bytes were downloaded from, when there was one.
    pub source_url: Option<String>,
}

pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ImageRequest) -> Result<ImageBytes>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Dryrun,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Dryrun => "dryrun",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "dryrun" => Ok(ProviderKind::Dryrun),
            other => bail!("unknown provider '{other}' (expected openai or dryrun)"),
        }
    }
}

pub type ProviderPair = (Arc<dyn TextProvider>, Arc<dyn ImageProvider>);

/// Builds the text and image providers for `kind`. The remote provider needs
/// credentials; their absence is the one fatal startup condition.
pub fn build_providers(kind: ProviderKind, config: &AgentConfig) -> Result<ProviderPair> {
    match kind {
        ProviderKind::OpenAi => {
            let provider = Arc::new(OpenAiCompatProvider::from_config(config)?);
            let text: Arc<dyn TextProvider> = provider.clone();
            let images: Arc<dyn ImageProvider> = provider;
            Ok((text, images))
        }
        ProviderKind::Dryrun => {
            let provider = Arc::new(DryrunProvider);
            let text: Arc<dyn TextProvider> = provider.clone();
            let images: Arc<dyn ImageProvider> = provider;
            Ok((text, images))
        }
    }
}
