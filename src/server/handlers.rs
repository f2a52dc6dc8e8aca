use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::InstanceConfig;
use crate::error::ConfigError;
use crate::host::HostTimezone;
use crate::store::PublishedAttributes;
use crate::updater::Instance;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        let status = match err {
            ConfigError::UnknownInstance(_) => StatusCode::NOT_FOUND,
            ConfigError::DuplicateInstance(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        api_error(status, err.to_string())
    }
}

// ─── Instances ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct InstanceList {
    pub instances: Vec<String>,
}

#[derive(Serialize)]
pub struct InstanceResponse {
    pub id: String,
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
    pub public_lands: bool,
    /// `None` until the first update cycle completes.
    pub attributes: Option<PublishedAttributes>,
}

fn describe_instance(state: &AppState, instance: &Instance) -> InstanceResponse {
    let coord = instance.coordinate();
    InstanceResponse {
        id: instance.id().to_string(),
        provider: instance.kind().display_name().to_string(),
        latitude: coord.lat,
        longitude: coord.lon,
        language: instance.language().to_string(),
        public_lands: instance.public_lands_enabled(),
        attributes: state.geolocator.store().get(instance.id()).map(|s| s.attributes()),
    }
}

// GET /api/instances
pub async fn list_instances(State(state): State<Arc<AppState>>) -> Json<InstanceList> {
    Json(InstanceList {
        instances: state.geolocator.ids(),
    })
}

// GET /api/instances/{id}
pub async fn get_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InstanceResponse>, ApiError> {
    let instance = state
        .geolocator
        .instance(&id)
        .ok_or(ConfigError::UnknownInstance(id))?;
    Ok(Json(describe_instance(&state, &instance)))
}

// POST /api/instances/{id}/update
pub async fn update_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PublishedAttributes>, ApiError> {
    let snapshot = state.geolocator.update_now(&id).await?;
    Ok(Json(snapshot.attributes()))
}

// PUT /api/instances/{id}
pub async fn reconfigure_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(config): Json<InstanceConfig>,
) -> Result<Json<InstanceResponse>, ApiError> {
    if config.id != id {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("body id '{}' does not match path id '{}'", config.id, id),
        ));
    }
    let instance = state.geolocator.reconfigure(&config)?;
    Ok(Json(describe_instance(&state, &instance)))
}

// DELETE /api/instances/{id}
pub async fn deactivate_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.geolocator.deactivate(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ConfigError::UnknownInstance(id).into())
    }
}

// ─── Host time zone ──────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct TimezoneBody {
    pub time_zone: Option<String>,
}

// GET /api/timezone
pub async fn get_timezone(State(state): State<Arc<AppState>>) -> Json<TimezoneBody> {
    Json(TimezoneBody {
        time_zone: state.geolocator.updater().host().current_timezone(),
    })
}

// POST /api/timezone
pub async fn set_timezone(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TimezoneBody>,
) -> Result<Json<TimezoneBody>, ApiError> {
    let Some(tz) = body.time_zone.as_deref() else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'time_zone' field"));
    };
    let host = state.geolocator.updater().host();
    host.set_timezone(tz)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(TimezoneBody {
        time_zone: host.current_timezone(),
    }))
}
