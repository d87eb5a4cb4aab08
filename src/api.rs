use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::broker::{FinkBroker, GenericAlert};
use crate::error::FinkError;
use crate::form::{FormField, QueryForm};
use crate::target::{TargetError, TargetHandle, TargetStore};

#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<FinkBroker>,
    pub targets: Arc<dyn TargetStore>,
}

impl AppState {
    pub fn new(broker: FinkBroker, targets: Arc<dyn TargetStore>) -> Self {
        Self {
            broker: Arc::new(broker),
            targets,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/form", get(form))
        .route("/alerts", post(query_alerts))
        .route("/alerts/{object_id}", get(alert_by_object))
        .route("/targets", post(create_target))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct FormOut {
    broker: &'static str,
    fields: &'static [FormField],
}

async fn form(State(state): State<AppState>) -> Json<FormOut> {
    Json(FormOut {
        broker: state.broker.name(),
        fields: QueryForm::fields(),
    })
}

async fn query_alerts(
    State(state): State<AppState>,
    Json(form): Json<QueryForm>,
) -> Result<Json<Vec<GenericAlert>>, ApiError> {
    let params = form.into_parameters();
    let alerts = state.broker.fetch_generic_alerts(&params).await?;
    Ok(Json(alerts))
}

async fn alert_by_object(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.broker.fetch_alert(&object_id).await?))
}

async fn create_target(
    State(state): State<AppState>,
    Json(alert): Json<GenericAlert>,
) -> Result<(StatusCode, Json<TargetHandle>), ApiError> {
    let handle = state.broker.to_target(&alert, state.targets.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(handle)))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Maps adapter errors onto HTTP statuses for the host UI.
#[derive(Debug)]
pub struct ApiError(pub FinkError);

impl From<FinkError> for ApiError {
    fn from(e: FinkError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            e if e.is_user_error() => (StatusCode::BAD_REQUEST, "INVALID_QUERY"),
            FinkError::RemoteService { .. } => (StatusCode::BAD_GATEWAY, "FINK_ERROR"),
            FinkError::MalformedRecord(_) | FinkError::UnexpectedPayload(_) => {
                (StatusCode::BAD_GATEWAY, "FINK_PAYLOAD")
            }
            FinkError::Transport(_) => (StatusCode::SERVICE_UNAVAILABLE, "FINK_UNREACHABLE"),
            FinkError::Target(TargetError::DuplicateName(_)) => {
                (StatusCode::CONFLICT, "TARGET_EXISTS")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "fink request failed");
        }
        let body = ErrorBody {
            code,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
