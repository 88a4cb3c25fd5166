//! Playlist and EPG export endpoints (`/get.php`, `/xmltv.php`)

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::xtream::auth_failed;
use crate::models::Catalog;
use crate::services::auth;
use crate::AppState;

const M3U_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const XML_CONTENT_TYPE: &str = "application/xml";

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Render a catalog as an M3U whose URLs point back at this gateway's own
/// stream endpoint. The caller-supplied credentials are embedded verbatim so
/// the exported playlist authenticates as that same identity.
pub fn render_playlist(
    catalog: &Catalog,
    base_url: &str,
    username: &str,
    password: &str,
) -> String {
    let mut out = String::from("#EXTM3U\n");
    for ch in &catalog.channels {
        let epg_id = ch.epg_channel_id.as_deref().unwrap_or("");
        let group = catalog.category_name(ch.category_id);
        out.push_str(&format!(
            "#EXTINF:-1 tvg-id=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n",
            epg_id, ch.stream_icon, group, ch.name
        ));
        out.push_str(&format!(
            "{}/live/{}/{}/{}.ts\n",
            base_url, username, password, ch.stream_id
        ));
    }
    out
}

/// GET /get.php - generated playlist of the user's channels
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let Some(user) = auth::authenticate(&state.registry, &query.username, &query.password) else {
        return Err((StatusCode::FORBIDDEN, Json(auth_failed())));
    };

    let catalog = state.catalog.get_or_load(user).await;
    let body = render_playlist(
        &catalog,
        &state.config.base_url,
        &query.username,
        &query.password,
    );

    Ok(([(header::CONTENT_TYPE, M3U_CONTENT_TYPE)], body).into_response())
}

/// GET /xmltv.php - the user's guide document, passed through verbatim
pub async fn get_epg(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let Some(user) = auth::authenticate(&state.registry, &query.username, &query.password) else {
        return Err((StatusCode::FORBIDDEN, Json(auth_failed())));
    };

    let document = state.epg.get(user).await;
    Ok((
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        document.as_str().to_owned(),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::m3u_parser::parse_m3u;

    fn sample_catalog() -> Catalog {
        parse_m3u(
            "#EXTM3U\n\
             #EXTINF:-1 group-title=\"News\" tvg-id=\"bbc1\" tvg-logo=\"http://logo/1.png\",BBC One\n\
             http://prov/1\n\
             #EXTINF:-1,Unknown\n\
             http://prov/2",
        )
        .unwrap()
    }

    #[test]
    fn test_rendered_urls_point_back_at_gateway() {
        let rendered = render_playlist(&sample_catalog(), "http://gw.local", "alice", "secret");
        assert!(rendered.starts_with("#EXTM3U\n"));
        assert!(rendered.contains("http://gw.local/live/alice/secret/1.ts"));
        assert!(rendered.contains("http://gw.local/live/alice/secret/2.ts"));
        assert!(rendered.contains("group-title=\"News\",BBC One"));
        assert!(rendered.contains("group-title=\"Uncategorized\",Unknown"));
        assert!(!rendered.contains("http://prov/"));
    }

    #[test]
    fn test_export_round_trips_through_parser() {
        let catalog = sample_catalog();
        let rendered = render_playlist(&catalog, "http://gw.local", "alice", "secret");
        let reparsed = parse_m3u(&rendered).unwrap();

        assert_eq!(reparsed.channels.len(), catalog.channels.len());
        assert_eq!(reparsed.categories.len(), catalog.categories.len());
        assert_eq!(reparsed.channels[0].name, "BBC One");
        assert_eq!(reparsed.channels[0].epg_channel_id.as_deref(), Some("bbc1"));
    }

    #[test]
    fn test_empty_catalog_renders_header_only() {
        let rendered = render_playlist(&Catalog::default(), "http://gw.local", "a", "b");
        assert_eq!(rendered, "#EXTM3U\n");
    }
}
