use std::io::Cursor;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lyric_contracts::analysis::METADATA_MARKER;
use sha2::{Digest, Sha256};

use super::{ChatPurpose, ChatRequest, ImageBytes, ImageProvider, ImageRequest, TextProvider};

const DRYRUN_MAX_EDGE: u32 = 512;

/// Offline stand-in for the remote API: canned text and solid-colour PNGs
/// whose colour is derived from the prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunProvider;

impl TextProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let tag = short_id(&request.user, 0);
        let reply = match request.purpose {
            ChatPurpose::Analysis => format!(
                "🎵 dryrun 赏析 {tag}\n\n{}\n\n#dryrun #lyrics\n\n{METADATA_MARKER}\nTitle: Dryrun Song {tag}\nArtist: Dryrun Artist\n",
                request.user.trim()
            ),
            ChatPurpose::VisualPrompt => [
                "grainy paper texture",
                "soft gradient glow",
                "tiny high-contrast object",
            ]
            .iter()
            .map(|style| format!("{style}, {tag}, text area is clean, low-noise --ar 3:4"))
            .collect::<Vec<_>>()
            .join("\n"),
        };
        Ok(reply)
    }
}

impl ImageProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &ImageRequest) -> Result<ImageBytes> {
        let (width, height) = parse_dims(&request.size);
        let (r, g, b) = color_from_prompt(&request.prompt);
        let mut image = RgbImage::new(width, height);
        for pixel in image.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode dryrun image")?;
        Ok(ImageBytes {
            bytes,
            mime_type: Some("image/png".to_string()),
            source_url: Some(format!("dryrun://{}", short_id(&request.prompt, 1))),
        })
    }
}

fn parse_dims(size: &str) -> (u32, u32) {
    let mut parts = size.split('x');
    let width = parts.next().and_then(|value| value.trim().parse::<u32>().ok());
    let height = parts.next().and_then(|value| value.trim().parse::<u32>().ok());
    match (width, height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            (width.min(DRYRUN_MAX_EDGE), height.min(DRYRUN_MAX_EDGE))
        }
        _ => (DRYRUN_MAX_EDGE, DRYRUN_MAX_EDGE),
    }
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}

fn short_id(text: &str, idx: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(idx.to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}
