//! 인증 미들웨어.
//!
//! 설정된 위치에서 자격 증명을 꺼내 토큰 엔진으로 검증하고, 성공하면
//! 요청 확장에 인증 정보를 넣습니다.

use axum::{
    extract::{Query, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, Uri,
    },
    middleware::Next,
    response::Response,
};
use sentinel_auth::{Authenticator, Claims, BEARER};
use sentinel_core::errno::ERR_UNAUTHORIZED;
use sentinel_core::{Error, OpContext};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::SkipRules;
use crate::context::inject_auth;
use crate::metrics::record_auth;
use crate::response::{error_response, locale_from};

/// 에러 응답 핸들러.
pub type ErrorHandler = Arc<dyn Fn(Error) -> Response + Send + Sync>;

/// 인증 성공 콜백.
pub type SuccessHandler = Arc<dyn Fn(&Claims) + Send + Sync>;

/// 자격 증명 위치.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// 헤더 (스킴 접두사는 제거)
    Header(String),
    /// 쿼리 파라미터
    Query(String),
    /// 쿠키
    Cookie(String),
}

impl Default for TokenSource {
    fn default() -> Self {
        TokenSource::Header(AUTHORIZATION.as_str().to_string())
    }
}

impl TokenSource {
    /// 요청에서 자격 증명을 꺼냅니다. 없거나 비어 있으면 `None`.
    pub fn extract(&self, headers: &HeaderMap, uri: &Uri, scheme: &str) -> Option<String> {
        let token = match self {
            TokenSource::Header(name) => {
                let value = headers.get(name.as_str())?.to_str().ok()?;
                strip_scheme(value.trim(), scheme).trim().to_string()
            }
            TokenSource::Query(name) => {
                let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
                params.get(name)?.trim().to_string()
            }
            TokenSource::Cookie(name) => cookie_value(headers, name)?.to_string(),
        };
        (!token.is_empty()).then_some(token)
    }
}

/// `"<scheme> "` 접두사를 대소문자 구분 없이 제거합니다.
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> &'a str {
    if scheme.is_empty() {
        return value;
    }
    match value.get(..scheme.len()) {
        Some(head)
            if head.eq_ignore_ascii_case(scheme)
                && value[scheme.len()..].starts_with(char::is_whitespace) =>
        {
            &value[scheme.len()..]
        }
        _ => value,
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// 인증 미들웨어 설정.
///
/// ```rust,ignore
/// let config = Arc::new(
///     AuthLayerConfig::new(authenticator)
///         .skip_path("/health")
///         .skip_prefix("/public/"),
/// );
/// let app = router.layer(middleware::from_fn_with_state(config, auth_middleware));
/// ```
#[derive(Clone)]
pub struct AuthLayerConfig {
    authenticator: Arc<dyn Authenticator>,
    source: TokenSource,
    scheme: String,
    skip: SkipRules,
    on_error: Option<ErrorHandler>,
    on_success: Option<SuccessHandler>,
}

impl AuthLayerConfig {
    /// `Authorization: Bearer <token>` 헤더를 읽는 기본 설정.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            source: TokenSource::default(),
            scheme: BEARER.to_string(),
            skip: SkipRules::new(),
            on_error: None,
            on_success: None,
        }
    }

    pub fn token_source(mut self, source: TokenSource) -> Self {
        self.source = source;
        self
    }

    /// 헤더 자격 증명의 스킴. 빈 문자열이면 헤더 값 전체를 토큰으로 씁니다.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip = self.skip.path(path);
        self
    }

    pub fn skip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.skip = self.skip.prefix(prefix);
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(Error) -> Response + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub fn on_success<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Claims) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(handler));
        self
    }

    fn reject(&self, err: Error, headers: &HeaderMap) -> Response {
        match &self.on_error {
            Some(handler) => handler(err),
            None => error_response(&err, locale_from(headers)),
        }
    }
}

impl fmt::Debug for AuthLayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthLayerConfig")
            .field("authenticator", &self.authenticator.kind())
            .field("source", &self.source)
            .field("scheme", &self.scheme)
            .field("skip", &self.skip)
            .finish()
    }
}

/// 인증 미들웨어.
pub async fn auth_middleware(
    State(config): State<Arc<AuthLayerConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    if config.skip.matches(request.uri().path()) {
        record_auth("skipped");
        return next.run(request).await;
    }

    let Some(token) = config
        .source
        .extract(request.headers(), request.uri(), &config.scheme)
    else {
        record_auth("missing");
        tracing::debug!(path = %request.uri().path(), "Request without credentials");
        let err = ERR_UNAUTHORIZED.with_message("missing authentication token");
        return config.reject(err, request.headers());
    };

    let ctx = OpContext::background();
    match config.authenticator.verify(&ctx, &token).await {
        Ok(claims) => {
            record_auth("ok");
            if let Some(handler) = &config.on_success {
                handler(&claims);
            }
            inject_auth(request.extensions_mut(), claims, token);
            next.run(request).await
        }
        Err(err) => {
            record_auth(&err.code().to_string());
            tracing::warn!(
                path = %request.uri().path(),
                code = err.code(),
                error = %err,
                "Authentication failed"
            );
            config.reject(err, request.headers())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_header_source_strips_scheme() {
        let source = TokenSource::default();
        let uri = Uri::from_static("/");

        let h = headers("authorization", "Bearer abc.def.ghi");
        assert_eq!(source.extract(&h, &uri, "Bearer").as_deref(), Some("abc.def.ghi"));

        let h = headers("authorization", "bearer   abc.def.ghi  ");
        assert_eq!(source.extract(&h, &uri, "Bearer").as_deref(), Some("abc.def.ghi"));

        // 스킴 없이 토큰만 보낸 경우도 그대로 사용
        let h = headers("authorization", "abc.def.ghi");
        assert_eq!(source.extract(&h, &uri, "Bearer").as_deref(), Some("abc.def.ghi"));

        let h = headers("authorization", "Bearer ");
        assert_eq!(source.extract(&h, &uri, "Bearer"), None);
        assert_eq!(source.extract(&HeaderMap::new(), &uri, "Bearer"), None);
    }

    #[test]
    fn test_scheme_requires_separator() {
        assert_eq!(strip_scheme("Bearerabc", "Bearer"), "Bearerabc");
        assert_eq!(strip_scheme("Bearer abc", ""), "Bearer abc");
        assert_eq!(strip_scheme("Be", "Bearer"), "Be");
    }

    #[test]
    fn test_query_source() {
        let source = TokenSource::Query("access_token".to_string());
        let uri = Uri::from_static("/ws?room=1&access_token=xyz");
        assert_eq!(
            source.extract(&HeaderMap::new(), &uri, BEARER).as_deref(),
            Some("xyz")
        );

        let uri = Uri::from_static("/ws?access_token=");
        assert_eq!(source.extract(&HeaderMap::new(), &uri, BEARER), None);
    }

    #[test]
    fn test_cookie_source() {
        let source = TokenSource::Cookie("session".to_string());
        let uri = Uri::from_static("/");

        let h = headers("cookie", "theme=dark; session=tok123; lang=ko");
        assert_eq!(source.extract(&h, &uri, BEARER).as_deref(), Some("tok123"));

        let h = headers("cookie", "theme=dark");
        assert_eq!(source.extract(&h, &uri, BEARER), None);
    }
}
