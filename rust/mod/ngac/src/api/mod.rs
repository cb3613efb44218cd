mod accounts;
mod assets;
mod middleware;
mod partitions;

use std::sync::Arc;

use axum::Router;

use crate::service::NgacService;

pub use middleware::{Principal, PRINCIPAL_HEADER};

/// Shared application state.
pub type AppState = Arc<NgacService>;

/// Build the complete policy engine router, nested under `/ngac`.
pub fn build_router(svc: Arc<NgacService>) -> Router {
    let api = Router::new()
        .merge(partitions::routes())
        .merge(accounts::routes())
        .merge(assets::routes());

    Router::new()
        .nest("/ngac", api)
        .layer(axum::middleware::from_fn(middleware::principal_middleware))
        .with_state(svc)
}
