use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use blossom_core::ServiceError;

use crate::api::{AppState, Principal};
use crate::model::{Account, AccountStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(request_account).get(list_accounts))
        .route("/accounts/{name}/status", put(update_status))
}

async fn request_account(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Json(input): Json<Account>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    svc.request_account(&principal, &input)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(json!({"account": input.name}))))
}

/// Accounts the caller may view.
async fn list_accounts(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
) -> Result<Json<Value>, ServiceError> {
    let names = svc.list_accounts(&principal).map_err(ServiceError::from)?;
    Ok(Json(json!({"items": names})))
}

#[derive(Deserialize)]
struct UpdateStatus {
    status: AccountStatus,
}

async fn update_status(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(name): Path<String>,
    Json(input): Json<UpdateStatus>,
) -> Result<StatusCode, ServiceError> {
    svc.update_account_status(&principal, &name, input.status)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
