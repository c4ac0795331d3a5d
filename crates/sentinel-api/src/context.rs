//! 요청 범위 인증 컨텍스트.
//!
//! 인증 미들웨어가 검증에 성공하면 Claims, Principal, 원본 토큰을 요청
//! 확장(extensions)에 넣습니다. 핸들러는 이 모듈의 접근자나 추출기로만
//! 꺼내 씁니다.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Extensions};
use sentinel_auth::{Claims, Principal};
use sentinel_core::errno::ERR_UNAUTHORIZED;

use crate::response::ApiError;

/// 요청에 부착된 원본 토큰.
#[derive(Debug, Clone)]
struct RawToken(String);

/// 검증된 Claims와 토큰을 요청 확장에 넣습니다.
pub fn inject_auth(extensions: &mut Extensions, claims: Claims, token: String) {
    extensions.insert(Principal::from(&claims));
    extensions.insert(claims);
    extensions.insert(RawToken(token));
}

/// 요청의 Claims.
pub fn claims_from(extensions: &Extensions) -> Option<&Claims> {
    extensions.get::<Claims>()
}

/// 요청의 주체 ID. 인증되지 않았거나 비어 있으면 `None`.
pub fn subject_from(extensions: &Extensions) -> Option<&str> {
    extensions
        .get::<Principal>()
        .map(Principal::subject)
        .filter(|s| !s.is_empty())
}

/// 요청의 원본 토큰.
pub fn token_from(extensions: &Extensions) -> Option<&str> {
    extensions.get::<RawToken>().map(|t| t.0.as_str())
}

/// 인증된 Principal 추출기.
///
/// ```rust,ignore
/// async fn handler(AuthPrincipal(principal): AuthPrincipal) -> String {
///     principal.subject().to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthPrincipal)
            .ok_or_else(|| ERR_UNAUTHORIZED.with_message("no authenticated principal").into())
    }
}

/// 인증된 Claims 추출기.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from(&parts.extensions)
            .cloned()
            .map(AuthClaims)
            .ok_or_else(|| ERR_UNAUTHORIZED.with_message("no authenticated principal").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims() -> Claims {
        let mut claims = Claims {
            sub: "bob".to_string(),
            exp: 100,
            jti: "t1".to_string(),
            ..Default::default()
        };
        claims.extras.insert("role".to_string(), json!("editor"));
        claims
    }

    #[test]
    fn test_inject_and_read_back() {
        let mut extensions = Extensions::new();
        assert!(claims_from(&extensions).is_none());
        assert!(subject_from(&extensions).is_none());

        inject_auth(&mut extensions, claims(), "raw-token".to_string());
        assert_eq!(claims_from(&extensions).map(|c| c.jti.as_str()), Some("t1"));
        assert_eq!(subject_from(&extensions), Some("bob"));
        assert_eq!(token_from(&extensions), Some("raw-token"));

        let principal = extensions.get::<Principal>().unwrap();
        assert!(principal.has_extra("role", "editor"));
    }

    #[tokio::test]
    async fn test_extractor_rejects_anonymous_request() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let rejection = AuthPrincipal::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(rejection.0.code(), ERR_UNAUTHORIZED.code());

        inject_auth(&mut parts.extensions, claims(), "raw".to_string());
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(principal.subject(), "bob");
    }
}
