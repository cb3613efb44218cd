use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use blossom_core::ServiceError;

use crate::api::{AppState, Principal};
use crate::model::{Asset, SwidReport};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", post(onboard_asset))
        .route("/assets/{id}", delete(offboard_asset))
        .route("/assets/{id}/checkout", post(checkout))
        .route("/assets/{id}/checkin", post(checkin))
        .route("/swids", post(report_swid))
}

async fn onboard_asset(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Json(input): Json<Asset>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    svc.onboard_asset(&principal, &input)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(json!({"asset": input.id}))))
}

async fn offboard_asset(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.offboard_asset(&principal, &id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct LicenseRequest {
    account: String,
    licenses: Vec<String>,
}

async fn checkout(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(id): Path<String>,
    Json(input): Json<LicenseRequest>,
) -> Result<StatusCode, ServiceError> {
    svc.checkout(&principal, &input.account, &id, &input.licenses)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checkin(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(id): Path<String>,
    Json(input): Json<LicenseRequest>,
) -> Result<StatusCode, ServiceError> {
    svc.checkin(&principal, &input.account, &id, &input.licenses)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_swid(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Json(input): Json<SwidReport>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    svc.report_swid(&principal, &input)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(json!({"swid": input.primary_tag}))))
}
