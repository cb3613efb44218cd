use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The server binary collects modules and nests each one's routes under
/// `/{name}`.
pub trait Module: Send + Sync {
    /// Module name, used for logging and the route prefix.
    fn name(&self) -> &str;

    fn routes(&self) -> Router;
}
