//! Xtream panel protocol facade
//!
//! Single dispatch endpoint (`/player_api.php`) over the `action` query
//! parameter. POST is a convenience alias: urlencoded body parameters are
//! merged into the query with query values winning.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::xtream::{auth_failed, AuthorizationResponse};
use crate::models::{Category, Channel};
use crate::services::auth;
use crate::AppState;

/// Parameters accepted from the query string and, for POST, the form body.
#[derive(Debug, Default, Deserialize)]
pub struct ApiParams {
    pub username: Option<String>,
    pub password: Option<String>,
    pub action: Option<String>,
    pub category_id: Option<String>,
}

impl ApiParams {
    /// Merge body parameters under the query's: a body value only fills a
    /// field the query left unset.
    fn merged_with(mut self, body: ApiParams) -> Self {
        self.username = self.username.or(body.username);
        self.password = self.password.or(body.password);
        self.action = self.action.or(body.action);
        self.category_id = self.category_id.or(body.category_id);
        self
    }
}

/// Supported panel actions. Anything unmatched maps to `Unsupported` and is
/// answered with a generic error payload rather than a protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    LoginProbe,
    LiveCategories,
    LiveStreams,
    VodCategories,
    VodStreams,
    SeriesCategories,
    Series,
    Unsupported,
}

impl Action {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Action::LoginProbe,
            Some("get_live_categories") => Action::LiveCategories,
            Some("get_live_streams") => Action::LiveStreams,
            Some("get_vod_categories") => Action::VodCategories,
            Some("get_vod_streams") => Action::VodStreams,
            Some("get_series_categories") => Action::SeriesCategories,
            Some("get_series") => Action::Series,
            Some(_) => Action::Unsupported,
        }
    }
}

/// GET|POST /player_api.php
pub async fn player_api(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApiParams>,
    body: Option<Form<ApiParams>>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let params = match body {
        Some(Form(form)) => query.merged_with(form),
        None => query,
    };

    let username = params.username.as_deref().unwrap_or("");
    let password = params.password.as_deref().unwrap_or("");
    let Some(user) = auth::authenticate(&state.registry, username, password) else {
        return Err((StatusCode::FORBIDDEN, Json(auth_failed())));
    };

    let action = Action::parse(params.action.as_deref());
    if action == Action::Unsupported {
        tracing::debug!(
            "Unsupported action '{}' from '{}'",
            params.action.as_deref().unwrap_or(""),
            user.username
        );
    }

    let response = match action {
        Action::LoginProbe => Json(AuthorizationResponse::new(
            username,
            password,
            &state.config.base_url,
            state.config.port,
        ))
        .into_response(),
        // Catalog-backed actions block until the lazy load completes
        Action::LiveCategories => {
            let catalog = state.catalog.get_or_load(user).await;
            Json(catalog.categories.clone()).into_response()
        }
        Action::LiveStreams => {
            let catalog = state.catalog.get_or_load(user).await;
            let channels: Vec<Channel> = match params.category_id.as_deref() {
                Some(wanted) if !wanted.is_empty() => catalog
                    .channels
                    .iter()
                    .filter(|ch| ch.category_id.to_string() == wanted)
                    .cloned()
                    .collect(),
                _ => catalog.channels.clone(),
            };
            Json(channels).into_response()
        }
        // Unsupported catalogs: empty lists so probing clients don't error
        Action::VodCategories | Action::SeriesCategories => {
            Json(Vec::<Category>::new()).into_response()
        }
        Action::VodStreams | Action::Series => Json(Vec::<Channel>::new()).into_response(),
        Action::Unsupported => {
            Json(serde_json::json!({ "error": "Unknown action" })).into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::parse(None), Action::LoginProbe);
        assert_eq!(Action::parse(Some("")), Action::LoginProbe);
        assert_eq!(
            Action::parse(Some("get_live_categories")),
            Action::LiveCategories
        );
        assert_eq!(Action::parse(Some("get_live_streams")), Action::LiveStreams);
        assert_eq!(Action::parse(Some("get_series")), Action::Series);
        assert_eq!(Action::parse(Some("get_epg")), Action::Unsupported);
    }

    #[test]
    fn test_merge_favors_query() {
        let query = ApiParams {
            username: Some("alice".to_string()),
            password: None,
            action: Some("get_live_streams".to_string()),
            category_id: None,
        };
        let body = ApiParams {
            username: Some("bob".to_string()),
            password: Some("pw".to_string()),
            action: None,
            category_id: Some("3".to_string()),
        };

        let merged = query.merged_with(body);
        assert_eq!(merged.username.as_deref(), Some("alice"));
        assert_eq!(merged.password.as_deref(), Some("pw"));
        assert_eq!(merged.action.as_deref(), Some("get_live_streams"));
        assert_eq!(merged.category_id.as_deref(), Some("3"));
    }
}
