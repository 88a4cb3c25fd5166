//! Stream access gateway (`/live/{username}/{password}/{stream_id}`)
//!
//! Reached directly by media players, so failures here are plain transport
//! responses, never protocol-shaped JSON. Depending on deployment mode the
//! gateway answers with a 302 to the upstream URL or proxies the bytes
//! through itself.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use url::Url;

use crate::config::StreamMode;
use crate::services::auth;
use crate::AppState;

/// Strip a trailing media-extension suffix before parsing the id. Any other
/// trailing content is left alone and simply fails the integer parse.
fn parse_stream_id(segment: &str) -> Option<u32> {
    let id = segment
        .strip_suffix(".ts")
        .or_else(|| segment.strip_suffix(".m3u8"))
        .unwrap_or(segment);
    id.parse().ok()
}

/// Lowercased host of the channel's upstream URL, for the bypass check.
fn upstream_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// GET /live/:username/:password/:stream_id[.ts|.m3u8]
pub async fn live_stream(
    State(state): State<Arc<AppState>>,
    Path((username, password, stream)): Path<(String, String, String)>,
) -> Response {
    // Players hit this path without touching the JSON endpoints first, so
    // credentials are validated here independently.
    let Some(user) = auth::authenticate(&state.registry, &username, &password) else {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    };

    let Some(stream_id) = parse_stream_id(&stream) else {
        return (StatusCode::NOT_FOUND, "Stream not found").into_response();
    };

    // Lookup only; this endpoint never triggers a catalog load. An empty or
    // absent entry just fails the lookup. The cache is keyed by canonical
    // username, which may be cased differently than the path segment.
    let Some(catalog) = state.catalog.get(&user.username).await else {
        return (StatusCode::NOT_FOUND, "Stream not found").into_response();
    };

    let Some(channel) = catalog.channel(stream_id) else {
        return (StatusCode::NOT_FOUND, "Stream not found").into_response();
    };

    if let Some(host) = upstream_host(&channel.url) {
        if state.config.bypass_hosts.contains(&host) {
            // This host rejects gateway-originated traffic; clients must
            // use the direct URL
            return (
                StatusCode::CONFLICT,
                "This host does not accept proxied playback; use the direct source URL",
            )
                .into_response();
        }
    }

    match state.config.stream_mode {
        StreamMode::Redirect => redirect_found(&channel.url),
        StreamMode::Proxy => proxy_upstream(&state, &channel.url).await,
    }
}

/// 302 with the upstream URL. axum's `Redirect::temporary` emits 307, which
/// some players refuse to follow, so the response is built by hand.
fn redirect_found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = (StatusCode::FOUND, Body::empty()).into_response();
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => (StatusCode::NOT_FOUND, "Stream not found").into_response(),
    }
}

/// Open the upstream connection and pipe the bytes through unchanged.
///
/// When the client disconnects, axum drops the body stream, which drops the
/// reqwest response and cancels the upstream request. An upstream failure
/// after headers have been sent just truncates the stream.
async fn proxy_upstream(state: &AppState, url: &str) -> Response {
    let request = state
        .fetcher
        .stream_client()
        .get(url)
        .header(reqwest::header::REFERER, url);

    let upstream = match request.send().await {
        Ok(resp) => resp,
        Err(err) => {
            tracing::error!("Proxy upstream error for {}: {}", url, err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Upstream error").into_response();
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::OK);

    // Mirror upstream headers verbatim, minus hop-by-hop ones that hyper
    // manages itself. reqwest and axum sit on different http crate versions,
    // so names and values cross over as bytes.
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        let name = name.as_str();
        if name.eq_ignore_ascii_case("connection") || name.eq_ignore_ascii_case("transfer-encoding")
        {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.insert(name, value);
        }
    }

    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_id_strips_media_suffixes() {
        assert_eq!(parse_stream_id("12"), Some(12));
        assert_eq!(parse_stream_id("12.ts"), Some(12));
        assert_eq!(parse_stream_id("12.m3u8"), Some(12));
    }

    #[test]
    fn test_parse_stream_id_rejects_other_content() {
        assert_eq!(parse_stream_id("12.mp4"), None);
        assert_eq!(parse_stream_id("abc"), None);
        assert_eq!(parse_stream_id(""), None);
        assert_eq!(parse_stream_id(".ts"), None);
    }

    #[test]
    fn test_upstream_host() {
        assert_eq!(
            upstream_host("http://CDN.Example.com:8080/live/1.ts").as_deref(),
            Some("cdn.example.com")
        );
        assert_eq!(upstream_host("not a url"), None);
    }

    #[test]
    fn test_redirect_found_sets_location() {
        let response = redirect_found("http://prov/1");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://prov/1"
        );
    }
}
