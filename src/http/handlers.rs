//! Route handlers.

use axum::{extract::Request, Json};
use serde_json::{json, Value};

use crate::auth::ClaimSet;
use crate::http::error::AppError;

/// `GET /secure`: echo the claims the gate attached.
pub async fn secure(mut request: Request) -> Result<Json<ClaimSet>, AppError> {
    let claims = request
        .extensions_mut()
        .remove::<ClaimSet>()
        .ok_or_else(|| AppError::internal("claim set missing from request context"))?;
    Ok(Json(claims))
}

/// `GET /ping`: unauthenticated liveness check.
pub async fn ping() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "You are pinging the API",
    }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn secure_returns_attached_claims() {
        let claims = ClaimSet::new().with("sub", "user1");
        let mut request = Request::new(Body::empty());
        request.extensions_mut().insert(claims.clone());

        let Json(body) = secure(request).await.unwrap();
        assert_eq!(body, claims);
    }

    #[tokio::test]
    async fn secure_without_claims_is_internal_error() {
        let err = secure(Request::new(Body::empty())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
