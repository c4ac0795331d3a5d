//! 인가 미들웨어.
//!
//! 요청에서 `(subject, object, action)`을 뽑아 정책 판정자에게 묻습니다.
//! 기본 추출 규칙:
//!
//! - subject: 인증 미들웨어가 넣은 Principal의 주체 ID
//! - object: `/`, `api/`, `v1/`, `v2/` 접두사를 걷어낸 뒤 첫 경로 세그먼트
//! - action: HTTP 메서드 매핑 ([`default_action`])

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use sentinel_authz::Authorizer;
use sentinel_core::errno::{ERR_NO_PERMISSION, ERR_UNAUTHORIZED};
use sentinel_core::{Error, OpContext};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::{ErrorHandler, SkipRules};
use crate::context::subject_from;
use crate::metrics::{record_authz, record_authz_duration};
use crate::response::{error_response, locale_from};

/// 요청에서 판정 인자 하나를 뽑는 함수.
pub type RequestExtractor = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

/// `v` 뒤에 숫자만 오는 버전 세그먼트인지 확인합니다 (`v1`, `v10`).
fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// 경로에서 판정 대상(object)을 뽑습니다.
///
/// `/api/v1/posts/42` → `posts`, `/users` → `users`.
pub fn default_object(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    if segments.peek() == Some(&"api") {
        segments.next();
    }
    if segments.peek().is_some_and(|s| is_version_segment(s)) {
        segments.next();
    }
    segments.next().map(str::to_string)
}

/// HTTP 메서드를 동작(action)으로 변환합니다.
pub fn default_action(method: &Method) -> String {
    match *method {
        Method::GET | Method::HEAD => "read".to_string(),
        Method::POST => "create".to_string(),
        Method::PUT | Method::PATCH => "update".to_string(),
        Method::DELETE => "delete".to_string(),
        Method::OPTIONS => "options".to_string(),
        ref other => other.as_str().to_ascii_lowercase(),
    }
}

/// 인가 미들웨어 설정.
#[derive(Clone)]
pub struct AuthzLayerConfig {
    authorizer: Arc<dyn Authorizer>,
    subject: Option<RequestExtractor>,
    object: Option<RequestExtractor>,
    action: Option<RequestExtractor>,
    skip: SkipRules,
    on_error: Option<ErrorHandler>,
}

impl AuthzLayerConfig {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            authorizer,
            subject: None,
            object: None,
            action: None,
            skip: SkipRules::new(),
            on_error: None,
        }
    }

    pub fn subject_extractor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.subject = Some(Arc::new(f));
        self
    }

    pub fn object_extractor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.object = Some(Arc::new(f));
        self
    }

    pub fn action_extractor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(f));
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

    fn subject_of(&self, request: &Request) -> Option<String> {
        let subject = match &self.subject {
            Some(f) => f(request),
            None => subject_from(request.extensions()).map(str::to_string),
        };
        subject.filter(|s| !s.is_empty())
    }

    fn object_of(&self, request: &Request) -> String {
        let object = match &self.object {
            Some(f) => f(request),
            None => default_object(request.uri().path()),
        };
        object.unwrap_or_default()
    }

    fn action_of(&self, request: &Request) -> String {
        match &self.action {
            Some(f) => f(request).unwrap_or_default(),
            None => default_action(request.method()),
        }
    }

    fn reject(&self, err: Error, request: &Request) -> Response {
        match &self.on_error {
            Some(handler) => handler(err),
            None => error_response(&err, locale_from(request.headers())),
        }
    }
}

impl fmt::Debug for AuthzLayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthzLayerConfig")
            .field("custom_subject", &self.subject.is_some())
            .field("custom_object", &self.object.is_some())
            .field("custom_action", &self.action.is_some())
            .field("skip", &self.skip)
            .finish()
    }
}

/// 인가 미들웨어.
///
/// 인증 미들웨어 안쪽에 배치해야 기본 주체 추출이 동작합니다.
pub async fn authz_middleware(
    State(config): State<Arc<AuthzLayerConfig>>,
    request: Request,
    next: Next,
) -> Response {
    if config.skip.matches(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(subject) = config.subject_of(&request) else {
        record_authz("error");
        return config.reject(ERR_UNAUTHORIZED.with_message("no subject found"), &request);
    };
    let object = config.object_of(&request);
    let action = config.action_of(&request);

    let ctx = OpContext::background();
    let start = Instant::now();
    let decision = config
        .authorizer
        .authorize(&ctx, &subject, &object, &action)
        .await;
    record_authz_duration(start.elapsed().as_secs_f64());

    match decision {
        Ok(true) => {
            record_authz("allow");
            next.run(request).await
        }
        Ok(false) => {
            record_authz("deny");
            tracing::info!(%subject, %object, %action, "Permission denied");
            let err = ERR_NO_PERMISSION.with_formatted_message(format_args!(
                "permission denied: subject={subject} object={object} action={action}"
            ));
            config.reject(err, &request)
        }
        Err(err) => {
            record_authz("error");
            tracing::error!(%subject, %object, %action, error = %err, "Authorization check failed");
            config.reject(err, &request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_object() {
        assert_eq!(default_object("/api/v1/posts/42").as_deref(), Some("posts"));
        assert_eq!(default_object("/api/v2/users").as_deref(), Some("users"));
        assert_eq!(default_object("/v1/orders/").as_deref(), Some("orders"));
        assert_eq!(default_object("/api/posts").as_deref(), Some("posts"));
        assert_eq!(default_object("//reports//daily").as_deref(), Some("reports"));
        assert_eq!(default_object("/"), None);
        assert_eq!(default_object("/api/v1"), None);
        assert_eq!(default_object("/api/v3/posts/7").as_deref(), Some("posts"));
        assert_eq!(default_object("/v10/orders").as_deref(), Some("orders"));
        assert_eq!(default_object("/api/vx/posts").as_deref(), Some("vx"));
        assert_eq!(default_object("/api/v/posts").as_deref(), Some("v"));
        assert_eq!(default_object("/videos/1").as_deref(), Some("videos"));
    }

    #[test]
    fn test_default_action_table() {
        assert_eq!(default_action(&Method::GET), "read");
        assert_eq!(default_action(&Method::HEAD), "read");
        assert_eq!(default_action(&Method::POST), "create");
        assert_eq!(default_action(&Method::PUT), "update");
        assert_eq!(default_action(&Method::PATCH), "update");
        assert_eq!(default_action(&Method::DELETE), "delete");
        assert_eq!(default_action(&Method::OPTIONS), "options");
        assert_eq!(default_action(&Method::TRACE), "trace");

        let custom = Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(default_action(&custom), "purge");
    }
}
