use std::{collections::HashMap, sync::Arc};

use anyhow::Error;
use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    broadcast::ConnectionRegistry,
    clients::{NotificationStore, PushGateway},
    config::Config,
    dispatch::{Dispatcher, summary_message},
    error::DispatchError,
    models::{
        notification::CreateNotification,
        request::{CreateNotificationRequest, DispatchRequest, FeedQuery},
        response::{CreatedResponse, DispatchResponse, ErrorResponse, NotificationPage},
    },
};

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn NotificationStore>,
    pub gateway: Arc<dyn PushGateway>,
    pub registry: Arc<ConnectionRegistry>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/notification/create", post(create_notification))
        .route("/notification/all", get(list_notifications))
        .route("/notification/massnotifications", post(mass_notifications))
        .route("/notification/live", get(live_feed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(config: Config, state: Arc<AppState>) -> Result<(), Error> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Notification service started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Service unhealthy", e.to_string())),
        )
            .into_response(),
    }
}

async fn mass_notifications(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DispatchRequest>,
) -> Response {
    match state.dispatcher.dispatch(request).await {
        Ok(report) if report.success == 0 => (
            StatusCode::BAD_REQUEST,
            Json(DispatchResponse {
                message: "No notifications sent".to_string(),
                results: report,
            }),
        )
            .into_response(),
        Ok(report) => {
            let message = summary_message(&report);
            (StatusCode::OK, Json(DispatchResponse { message, results: report })).into_response()
        }
        Err(DispatchError::Validation(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(msg, "validation_error")),
        )
            .into_response(),
        Err(DispatchError::Internal(e)) => {
            error!(error = %e, "Mass notification dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Failed to process notifications",
                    e.to_string(),
                )),
            )
                .into_response()
        }
    }
}

async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateNotificationRequest>,
) -> Response {
    let recipient = match state.store.find_recipient_by_id(&body.user_id).await {
        Ok(Some(recipient)) => recipient,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("User not found", "unknown user id")),
            )
                .into_response();
        }
        Err(e) => return store_failure(e),
    };

    let Some(token) = recipient.usable_token() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "User has no registered device",
                "missing device token",
            )),
        )
            .into_response();
    };

    let metadata = HashMap::from([("type".to_string(), body.kind.clone())]);

    match state
        .gateway
        .send(token, &body.title, &body.description, &metadata)
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "Device token is no longer valid",
                    "invalid_token",
                )),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, user_id = %body.user_id, "Push delivery failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to send notification", e.to_string())),
            )
                .into_response();
        }
    }

    let mut record = CreateNotification::new(body.title, body.description, body.kind, body.user_id);
    if let Some(demand) = body.demand {
        record = record.with_demand(demand);
    }

    match state.store.create_notification(record).await {
        Ok(notification) => (
            StatusCode::OK,
            Json(CreatedResponse {
                message: "Notification created successfully".to_string(),
                data: notification,
            }),
        )
            .into_response(),
        Err(e) => store_failure(e),
    }
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Response {
    let page = query.page.max(1);
    let limit = query.limit.max(1);

    let notifications = match state.store.list_admin_notifications(page, limit).await {
        Ok(notifications) => notifications,
        Err(e) => return store_failure(e),
    };

    let total = match state.store.count_admin_notifications().await {
        Ok(total) => total,
        Err(e) => return store_failure(e),
    };

    let total_pages = total.div_ceil(limit);
    let has_more = notifications.len() as u64 == limit && page < total_pages;

    (
        StatusCode::OK,
        Json(NotificationPage {
            notifications,
            current_page: page,
            total_pages,
            total,
            has_more,
        }),
    )
        .into_response()
}

async fn live_feed(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| handle_live_connection(socket, registry))
}

/// Pumps broadcast events to one live connection for its lifetime. The
/// connection is removed from the registry as soon as either side closes.
async fn handle_live_connection(mut socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let (id, mut events) = registry.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };

                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Client frames carry nothing we act on.
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    registry.remove(id);
}

fn store_failure(e: Error) -> Response {
    error!(error = %e, "Store operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Failed to process notifications", e.to_string())),
    )
        .into_response()
}
