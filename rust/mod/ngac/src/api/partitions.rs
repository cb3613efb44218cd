use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use blossom_core::ServiceError;

use crate::api::{AppState, Principal};
use crate::epp::EventContext;
use crate::model::{Graph, GraphSnapshot, NodeKind};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/init", post(init))
        .route("/partitions", get(list_partitions))
        .route("/partitions/{partition}/init", post(init_partition))
        .route("/partitions/{partition}/graph", get(get_graph).put(update_graph))
        .route("/partitions/{partition}/permissions", get(list_permissions))
        .route("/partitions/{partition}/decide", get(decide))
        .route("/partitions/{partition}/nodes", get(find_nodes))
        .route("/partitions/{partition}/events", post(raise_event))
}

/// POST /ngac/init
///
/// Builds the base policy into the shared partition.
async fn init(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    svc.init(&principal).map_err(ServiceError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"partition": svc.shared_partition()})),
    ))
}

async fn list_partitions(State(svc): State<AppState>) -> Result<Json<Value>, ServiceError> {
    let names = svc.list_partitions().map_err(ServiceError::from)?;
    Ok(Json(json!({"items": names})))
}

async fn init_partition(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(partition): Path<String>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    svc.init_partition(&principal, &partition)
        .map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(json!({"partition": partition}))))
}

async fn get_graph(
    State(svc): State<AppState>,
    Path(partition): Path<String>,
) -> Result<Json<Graph>, ServiceError> {
    let graph = svc.graph(&partition).map_err(ServiceError::from)?;
    Ok(Json(graph))
}

/// PUT /ngac/partitions/{partition}/graph
///
/// Body is the full proposed graph. Responds with the commands applied.
async fn update_graph(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(partition): Path<String>,
    Json(snapshot): Json<GraphSnapshot>,
) -> Result<Json<Value>, ServiceError> {
    let proposed = Graph::try_from(snapshot).map_err(ServiceError::from)?;
    let applied = svc
        .update_graph(&partition, &principal, &proposed)
        .map_err(ServiceError::from)?;
    Ok(Json(json!({"applied": applied})))
}

#[derive(Deserialize)]
struct PermissionQuery {
    user: String,
    target: String,
}

async fn list_permissions(
    State(svc): State<AppState>,
    Path(partition): Path<String>,
    Query(q): Query<PermissionQuery>,
) -> Result<Json<Value>, ServiceError> {
    let ops = svc
        .list_permissions(&partition, &q.user, &q.target)
        .map_err(ServiceError::from)?;
    Ok(Json(json!({
        "user": q.user,
        "target": q.target,
        "operations": ops,
    })))
}

#[derive(Deserialize)]
struct DecideQuery {
    user: String,
    target: String,
    op: String,
}

/// GET /ngac/partitions/{partition}/decide?user=...&target=...&op=...
async fn decide(
    State(svc): State<AppState>,
    Path(partition): Path<String>,
    Query(q): Query<DecideQuery>,
) -> Result<Json<Value>, ServiceError> {
    let allowed = svc
        .decide(&partition, &q.user, &q.target, &q.op)
        .map_err(ServiceError::from)?;
    Ok(Json(json!({"allowed": allowed})))
}

#[derive(Deserialize)]
struct NodeQuery {
    kind: Option<String>,
    key: Option<String>,
    value: Option<String>,
}

async fn find_nodes(
    State(svc): State<AppState>,
    Path(partition): Path<String>,
    Query(q): Query<NodeQuery>,
) -> Result<Json<Value>, ServiceError> {
    let kind = match q.kind.as_deref() {
        Some(k) => Some(
            NodeKind::parse(k)
                .ok_or_else(|| ServiceError::Validation(format!("unknown node kind {:?}", k)))?,
        ),
        None => None,
    };
    let mut filter = BTreeMap::new();
    match (q.key, q.value) {
        (Some(key), Some(value)) => {
            filter.insert(key, value);
        }
        (None, None) => {}
        _ => {
            return Err(ServiceError::Validation(
                "key and value must be given together".into(),
            ))
        }
    }

    let nodes = svc
        .find_nodes(&partition, kind, &filter)
        .map_err(ServiceError::from)?;
    Ok(Json(json!({"items": nodes})))
}

#[derive(Deserialize)]
struct RaiseEvent {
    event: String,
    #[serde(default)]
    args: BTreeMap<String, String>,
}

async fn raise_event(
    State(svc): State<AppState>,
    Extension(Principal(principal)): Extension<Principal>,
    Path(partition): Path<String>,
    Json(input): Json<RaiseEvent>,
) -> Result<Json<Value>, ServiceError> {
    let ctx = EventContext {
        principal,
        event: input.event,
        args: input.args,
    };
    let fired = svc
        .raise_event(&partition, &ctx)
        .map_err(ServiceError::from)?;
    Ok(Json(json!({"fired": fired})))
}
