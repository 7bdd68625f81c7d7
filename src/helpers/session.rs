use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;

/// Header set by the authenticating gateway in front of this service.
pub const SESSION_USER_HEADER: &str = "x-authenticated-user";

/// Identity of the caller, taken from the session and never from the body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| SessionUser(v.to_string()))
            .ok_or(AppError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<SessionUser, AppError> {
        let (mut parts, _) = request.into_parts();
        SessionUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_identity_from_header() {
        let request = Request::builder()
            .header(SESSION_USER_HEADER, "alice")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap(), SessionUser("alice".into()));
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_unauthenticated() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Unauthenticated)));

        let request = Request::builder()
            .header(SESSION_USER_HEADER, " ")
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Unauthenticated)));
    }
}
