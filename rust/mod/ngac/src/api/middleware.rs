use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use blossom_core::ServiceError;

/// Header carrying the acting principal (`commonName:mspID`), set by the
/// fronting gateway after it has authenticated the caller.
pub const PRINCIPAL_HEADER: &str = "x-blossom-principal";

/// The acting principal, available to handlers as `Extension<Principal>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

/// Reject requests without a principal; otherwise stash it for handlers.
pub async fn principal_middleware(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let principal = match extract_principal(req.headers()) {
        Some(p) => p.to_string(),
        None => {
            return ServiceError::Unauthorized(format!("missing {} header", PRINCIPAL_HEADER))
                .into_response();
        }
    };

    req.extensions_mut().insert(Principal(principal));
    next.run(req).await
}

fn extract_principal(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_extract_principal() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_principal(&headers), None);

        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(extract_principal(&headers), None);

        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("Org1 Admin:Org1MSP"));
        assert_eq!(extract_principal(&headers), Some("Org1 Admin:Org1MSP"));
    }
}
