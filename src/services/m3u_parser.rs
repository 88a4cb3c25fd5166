use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::models::{Catalog, Category, Channel};

/// Category assigned to channels with no recognizable group attribute.
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

const HEADER_MARKER: &str = "#EXTM3U";
const ENTRY_MARKER: &str = "#EXTINF";

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("invalid playlist format (missing #EXTM3U header)")]
    MissingHeader,
}

lazy_static! {
    /// key="value" pairs on an EXTINF line. Keys are matched case-insensitively.
    static ref QUOTED_ATTR: Regex = Regex::new(r#"(?i)([a-z0-9-]+)="([^"]*)""#).unwrap();
    /// Bare key=token pairs; the value runs until whitespace, a comma, or a quote.
    static ref BARE_ATTR: Regex = Regex::new(r#"(?i)([a-z0-9-]+)=([^"\s,]+)"#).unwrap();
}

/// Extract a quoted `key="value"` attribute, case-insensitive on the key.
fn quoted_attr(line: &str, key: &str) -> Option<String> {
    QUOTED_ATTR
        .captures_iter(line)
        .find(|caps| caps[1].eq_ignore_ascii_case(key))
        .map(|caps| caps[2].to_string())
}

/// Extract an unquoted `key=token` attribute, case-insensitive on the key.
fn bare_attr(line: &str, key: &str) -> Option<String> {
    BARE_ATTR
        .captures_iter(line)
        .find(|caps| caps[1].eq_ignore_ascii_case(key))
        .map(|caps| caps[2].to_string())
}

/// Category name for an entry line, in priority order: quoted group-title,
/// bare group-title, quoted tvg-group. First match wins; None means the
/// fallback category applies.
fn extract_category(line: &str) -> Option<String> {
    quoted_attr(line, "group-title")
        .filter(|v| !v.is_empty())
        .or_else(|| bare_attr(line, "group-title"))
        .or_else(|| quoted_attr(line, "tvg-group").filter(|v| !v.is_empty()))
}

/// Display name: everything after the last comma of the entry line. An
/// entry with no usable name gets "Channel {n}", n being its 1-based
/// position among the channels parsed so far.
fn channel_name(line: &str, ordinal: usize) -> String {
    let name = line
        .rfind(',')
        .map(|idx| line[idx + 1..].trim())
        .unwrap_or("");
    if name.is_empty() {
        format!("Channel {ordinal}")
    } else {
        name.to_string()
    }
}

/// Parse raw M3U text into an ordered channel list and its categories.
///
/// Operates on the trimmed, non-blank line sequence so physical blank lines
/// never break entry/URL pairing. An entry line whose successor is missing
/// or itself starts with `#` is dropped without emitting a channel. Stream
/// and category ids are assigned sequentially within this single pass; they
/// are not stable across reparses if the upstream order changes.
pub fn parse_m3u(text: &str) -> Result<Catalog, PlaylistError> {
    if !text.contains(HEADER_MARKER) {
        return Err(PlaylistError::MissingHeader);
    }

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut channels: Vec<Channel> = Vec::new();
    let mut categories: Vec<Category> = Vec::new();
    let mut category_ids: HashMap<String, u32> = HashMap::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if !line.starts_with(ENTRY_MARKER) {
            i += 1;
            continue;
        }

        // Pair with the immediately following line only if it is a URL
        // candidate; otherwise drop this entry and keep scanning.
        let url = match lines.get(i + 1) {
            Some(next) if !next.starts_with('#') => *next,
            _ => {
                i += 1;
                continue;
            }
        };

        let category_name =
            extract_category(line).unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
        let category_id = *category_ids.entry(category_name.clone()).or_insert_with(|| {
            let id = categories.len() as u32 + 1;
            categories.push(Category::new(id, category_name));
            id
        });

        let stream_id = channels.len() as u32 + 1;
        let name = channel_name(line, stream_id as usize);
        let stream_icon = quoted_attr(line, "tvg-logo").unwrap_or_default();
        let epg_channel_id = quoted_attr(line, "tvg-id").filter(|v| !v.is_empty());

        channels.push(Channel::new(
            stream_id,
            name,
            stream_icon,
            epg_channel_id,
            category_id,
            url.to_string(),
        ));

        i += 2;
    }

    Ok(Catalog {
        channels,
        categories,
    })
}
