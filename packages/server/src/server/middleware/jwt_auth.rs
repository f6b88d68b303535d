use crate::common::MemberId;
use crate::domains::auth::JwtService;
use crate::server::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Authenticated member from JWT
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub member_id: MemberId,
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// JWT authentication middleware
///
/// Reads the token from the Authorization header, or from `?token=` since
/// EventSource cannot send headers. A verified token adds AuthUser to request
/// extensions; otherwise the request continues anonymously and handlers that
/// take an `AuthUser` reject it.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(user) = extract_auth_user(&request, &jwt_service) {
        debug!(member_id = %user.member_id, "authenticated member");
        request.extensions_mut().insert(user);
    } else {
        debug!("no valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let token = bearer_token(request).or_else(|| query_token(request))?;
    let member_id = jwt_service.member_for(&token)?;
    Some(AuthUser { member_id })
}

fn bearer_token(request: &axum::http::Request<axum::body::Body>) -> Option<String> {
    let auth_str = request.headers().get("authorization")?.to_str().ok()?;
    // Handle both "Bearer <token>" and raw token
    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).to_string())
}

fn query_token(request: &axum::http::Request<axum::body::Body>) -> Option<String> {
    let Query(query) = Query::<TokenQuery>::try_from_uri(request.uri()).ok()?;
    query.token.filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = service();
        let member_id = MemberId::new();
        let token = jwt_service.create_token(member_id).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert_eq!(auth_user, Some(AuthUser { member_id }));
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let jwt_service = service();
        let member_id = MemberId::new();
        let token = jwt_service.create_token(member_id).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", token)
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert_eq!(auth_user.map(|u| u.member_id), Some(member_id));
    }

    #[test]
    fn test_extract_token_from_query() {
        let jwt_service = service();
        let member_id = MemberId::new();
        let token = jwt_service.create_token(member_id).unwrap();

        let request = axum::http::Request::builder()
            .uri(format!("/api/scrapes/stream?runId=abc&token={}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert_eq!(auth_user.map(|u| u.member_id), Some(member_id));
    }

    #[test]
    fn test_no_auth_header() {
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &service()).is_none());
    }

    #[test]
    fn test_invalid_token() {
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &service()).is_none());
    }
}
