use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::live;
use crate::state::SharedState;
use crate::store::models::{NewNotification, Notification};

#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Persists a notification, then pushes it on the user's channel so an open
/// notification socket sees it immediately.
pub async fn create(
    State(state): State<SharedState>,
    Json(request): Json<NotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    let payload_json = match &request.payload {
        Some(payload) => Some(serde_json::to_string(payload).map_err(anyhow::Error::from)?),
        None => None,
    };

    let notification = state
        .store
        .create_notification(NewNotification {
            user_id: request.user_id,
            kind: request.kind.clone(),
            payload_json,
        })
        .await?;

    state.bus.publish(
        &live::user_channel(request.user_id),
        &json!({
            "type": request.kind,
            "payload": request.payload,
            "created_at": notification.created_at.to_rfc3339(),
        }),
    );

    info!(
        "Notification {} created for user {}",
        notification.id, notification.user_id
    );

    Ok(Json(notification))
}

pub async fn list(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.store.notifications_for_user(user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct MarkRead {
    pub user_id: i64,
}

pub async fn mark_read(
    State(state): State<SharedState>,
    Path(notification_id): Path<i64>,
    Json(body): Json<MarkRead>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .store
        .mark_notification_read(notification_id, body.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}
