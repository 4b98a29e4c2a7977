//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    domain::{PlaybackCommand, Platform, QueueError, QueueItem},
    infrastructure::dto::{
        conversion::now_playing_dto,
        http::{
            AddQueueItemRequest, ChatRequest, ChatResponse, ClientDto, NowPlayingDto, QueueDto,
            UpdateBackendRequest,
        },
    },
    ui::state::AppState,
};

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn get_queue(State(state): State<Arc<AppState>>) -> Json<QueueDto> {
    let queue = state.queue.get_queue().await;
    Json(QueueDto::from(&queue))
}

/// Append an already resolved item. Used with backends that cannot resolve links.
pub async fn add_queue_item(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<AddQueueItemRequest>,
) -> Result<(StatusCode, Json<QueueDto>), ApiError> {
    if request.track_id.trim().is_empty() || request.requested_by.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "trackId and requestedBy are required",
        ));
    }
    if request.platform.is_none() {
        request.platform = Some(state.playback.platform().await.tag());
    }

    match state.queue.try_add_to_queue(QueueItem::from(request)).await {
        Ok(_) => {
            let queue = state.queue.get_queue().await;
            Ok((StatusCode::CREATED, Json(QueueDto::from(&queue))))
        }
        Err(e @ QueueError::DuplicateItem(_)) => Err(api_error(StatusCode::CONFLICT, e)),
        Err(e) => Err(api_error(StatusCode::BAD_REQUEST, e)),
    }
}

pub async fn clear_queue(State(state): State<Arc<AppState>>) -> StatusCode {
    state.queue.clear_queue().await;
    StatusCode::NO_CONTENT
}

pub async fn remove_queue_item(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> StatusCode {
    if state.queue.remove_from_queue(index).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Overlay view of the last snapshot
pub async fn get_now_playing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NowPlayingDto>, StatusCode> {
    let snapshot = state
        .playback
        .last_snapshot()
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let hidden = state.monitor.is_hidden().await;
    Ok(Json(now_playing_dto(&snapshot, hidden)))
}

pub async fn get_clients(State(state): State<Arc<AppState>>) -> Json<Vec<ClientDto>> {
    let clients = state.repository.get_clients().await;
    Json(clients.iter().map(ClientDto::from).collect())
}

pub async fn issue_playback_command(
    State(state): State<Arc<AppState>>,
    Path(command): Path<String>,
) -> Result<StatusCode, ApiError> {
    let command = PlaybackCommand::from_simple_name(&command).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("unknown command '{}'", command),
        )
    })?;

    state
        .playback
        .try_issue_command(command)
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e))?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn update_backend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateBackendRequest>,
) -> Result<Json<Value>, ApiError> {
    let platform: Platform = request
        .platform
        .parse()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    state.playback.update_backend(platform.clone()).await;
    Ok(Json(json!({ "platform": platform.tag() })))
}

/// Run one chat line through the command dispatcher
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = state
        .chat_command_usecase
        .execute(&request.user, request.role, &request.message)
        .await;
    Json(ChatResponse { reply })
}
