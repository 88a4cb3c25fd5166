use serde::{Deserialize, Serialize};

/// Single live channel as exposed by the panel API.
///
/// The upstream source URL is internal routing state and is never serialized
/// to clients; `direct_source` goes out empty like most panels send it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub num: u32,
    pub name: String,
    pub stream_type: String,
    pub stream_id: u32,
    pub stream_icon: String,
    pub epg_channel_id: Option<String>,
    pub category_id: u32,
    #[serde(skip)]
    pub url: String,
    pub tv_archive: u8,
    pub tv_archive_duration: u8,
    #[serde(default)]
    pub direct_source: String,
}

impl Channel {
    pub fn new(
        stream_id: u32,
        name: String,
        stream_icon: String,
        epg_channel_id: Option<String>,
        category_id: u32,
        url: String,
    ) -> Self {
        Self {
            num: stream_id,
            name,
            stream_type: "live".to_string(),
            stream_id,
            stream_icon,
            epg_channel_id,
            category_id,
            url,
            tv_archive: 0,
            tv_archive_duration: 0,
            direct_source: String::new(),
        }
    }
}

/// Channel category. `parent_id` is always the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category_id: u32,
    pub category_name: String,
    pub parent_id: u32,
}

impl Category {
    pub fn new(category_id: u32, category_name: String) -> Self {
        Self {
            category_id,
            category_name,
            parent_id: 0,
        }
    }
}

/// One user's parsed playlist: channels in source order plus the categories
/// discovered during that parse. Replaced wholesale on every reload.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub channels: Vec<Channel>,
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Look up a channel by its per-catalog stream id.
    pub fn channel(&self, stream_id: u32) -> Option<&Channel> {
        self.channels.iter().find(|c| c.stream_id == stream_id)
    }

    /// Resolve a category name, falling back to the default label when the
    /// referenced id is unknown.
    pub fn category_name(&self, category_id: u32) -> &str {
        self.categories
            .iter()
            .find(|c| c.category_id == category_id)
            .map(|c| c.category_name.as_str())
            .unwrap_or(crate::services::m3u_parser::FALLBACK_CATEGORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_serialization_hides_upstream_url() {
        let ch = Channel::new(
            1,
            "BBC One".to_string(),
            String::new(),
            Some("bbc1".to_string()),
            1,
            "http://upstream.example/1".to_string(),
        );
        let json = serde_json::to_string(&ch).unwrap();
        assert!(!json.contains("upstream.example"));
        assert!(json.contains("\"stream_type\":\"live\""));
        assert!(json.contains("\"tv_archive\":0"));
    }

    #[test]
    fn test_category_name_fallback() {
        let catalog = Catalog {
            channels: vec![],
            categories: vec![Category::new(1, "News".to_string())],
        };
        assert_eq!(catalog.category_name(1), "News");
        assert_eq!(catalog.category_name(42), "Uncategorized");
    }
}
