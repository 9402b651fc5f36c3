//! Activity log endpoint: recent product and invoice changes, newest first.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::session::CurrentUser;
use crate::state::AppState;
use stockly_core::activity::activity_limit;
use stockly_core::{ActivityAction, ActivityLog};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityParams {
    /// Page size, clamped to 1..=500. Defaults to 50.
    pub limit: Option<i64>,
    /// Only entries about this product or invoice.
    pub entity_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: String,
    pub action_type: ActivityAction,
    pub entity_id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLog> for ActivityDto {
    fn from(entry: ActivityLog) -> Self {
        ActivityDto {
            id: entry.id,
            action_type: entry.action_type,
            entity_id: entry.entity_id,
            description: entry.description,
            created_at: entry.created_at,
        }
    }
}

/// `GET /api/activity?limit=20&entityId=...`
pub async fn list_activity(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    params: Result<Query<ActivityParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ActivityDto>>> {
    let Query(params) = params?;
    let entity_id = params.entity_id.as_deref().filter(|id| !id.trim().is_empty());

    let entries = state
        .db
        .activity()
        .list(&session, entity_id, activity_limit(params.limit))
        .await?;

    Ok(Json(entries.into_iter().map(ActivityDto::from).collect()))
}
