//! Parsing helpers for model output.
//!
//! The analysis model is asked to end its post with a metadata block:
//!
//! ```text
//! ===METADATA===
//! Title: <song name>
//! Artist: <artist>
//! ```

pub const METADATA_MARKER: &str = "===METADATA===";
pub const UNKNOWN_SONG: &str = "Unknown_Song";
pub const UNKNOWN_ARTIST: &str = "Unknown_Artist";
pub const FALLBACK_FILE_STEM: &str = "cover_image";

const TITLE_KEY: &str = "Title:";
const ARTIST_KEY: &str = "Artist:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnalysis {
    pub post: String,
    pub song_name: String,
    pub artist: String,
    pub has_metadata: bool,
}

pub fn parse_analysis_response(full_response: &str) -> ParsedAnalysis {
    let mut parts = full_response.split(METADATA_MARKER);
    let post = parts.next().unwrap_or_default().trim().to_string();
    let metadata = parts.next().map(str::trim).unwrap_or_default();

    let mut song_name = UNKNOWN_SONG.to_string();
    let mut artist = UNKNOWN_ARTIST.to_string();

    for line in metadata.lines() {
        if let Some(value) = value_after(line, TITLE_KEY) {
            song_name = value;
        } else if let Some(value) = value_after(line, ARTIST_KEY) {
            artist = value;
        }
    }

    ParsedAnalysis {
        post,
        song_name,
        artist,
        has_metadata: !metadata.is_empty(),
    }
}

fn value_after(line: &str, key: &str) -> Option<String> {
    if !line.contains(key) {
        return None;
    }
    line.split(key).nth(1).map(|value| value.trim().to_string())
}

/// Non-empty, trimmed lines of a prompt-generation response.
pub fn prompt_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Like [`prompt_lines`], but a response with no usable lines yields the
/// whole trimmed text as a single prompt.
pub fn split_prompts(raw: &str) -> Vec<String> {
    let lines = prompt_lines(raw);
    if lines.is_empty() {
        return vec![raw.trim().to_string()];
    }
    lines
}

/// Keeps letters, digits, spaces and underscores. Empty input maps to
/// [`FALLBACK_FILE_STEM`].
pub fn safe_filename(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    let trimmed = kept.trim_end();
    if trimmed.is_empty() {
        return FALLBACK_FILE_STEM.to_string();
    }
    trimmed.to_string()
}

pub fn or_unknown_song(song_name: &str) -> String {
    non_empty_or(song_name, UNKNOWN_SONG)
}

pub fn or_unknown_artist(artist: &str) -> String {
    non_empty_or(artist, UNKNOWN_ARTIST)
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// First `max_chars` characters of `text`, counted as chars rather than bytes.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
