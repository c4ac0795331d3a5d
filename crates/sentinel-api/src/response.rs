//! API 응답 봉투.
//!
//! 모든 응답은 `{code, message, data}` 형식입니다. 성공은 코드 0과 데이터,
//! 실패는 에러 코드와 메시지에 `data: null`을 담고 HTTP 상태는 코드의
//! HTTP 상태를 따릅니다.
//!
//! ```json
//! {
//!   "code": 3001,
//!   "message": "permission denied: subject=bob object=posts action=delete",
//!   "data": null
//! }
//! ```

use axum::extract::Request;
use axum::http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sentinel_core::errno::OK;
use sentinel_core::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 응답 봉투.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 에러 코드 (성공 시 0)
    pub code: i32,
    /// 메시지
    pub message: String,
    /// 응답 데이터 (실패 시 null)
    pub data: Option<T>,
}

/// 성공 응답을 만듭니다.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: OK.code(),
        message: "OK".to_string(),
        data: Some(data),
    })
}

/// 에러를 지정한 로케일의 응답으로 변환합니다.
///
/// 원인(cause)은 응답에 포함하지 않습니다.
pub fn error_response(err: &Error, locale: &str) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ApiResponse::<()> {
        code: err.code(),
        message: err.message(locale).into_owned(),
        data: None,
    };
    (status, Json(body)).into_response()
}

/// `Accept-Language` 헤더의 첫 번째 언어 태그. 없으면 `"en"`.
pub fn locale_from(headers: &HeaderMap) -> &str {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or(tag).trim())
        .filter(|tag| !tag.is_empty())
        .unwrap_or("en")
}

/// 핸들러 에러.
///
/// 핸들러는 요청 헤더를 모르므로 기본 로케일로 렌더링하고, 원본 에러를
/// 응답 확장에 남겨 [`localize_errors`]가 요청 로케일로 다시 렌더링하게 합니다.
#[derive(Debug)]
pub struct ApiError(pub Error);

#[derive(Clone)]
struct RenderedError(Arc<Error>);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.rpc_status() == sentinel_core::RpcCode::Internal {
            tracing::error!(code = self.0.code(), error = ?self.0, "Request failed");
        }
        let mut response = error_response(&self.0, "en");
        response
            .extensions_mut()
            .insert(RenderedError(Arc::new(self.0)));
        response
    }
}

/// [`ApiError`] 응답을 요청의 `Accept-Language`로 다시 렌더링하는 미들웨어.
pub async fn localize_errors(request: Request, next: Next) -> Response {
    let locale = locale_from(request.headers()).to_string();
    let response = next.run(request).await;
    let rendered = response.extensions().get::<RenderedError>().cloned();
    match rendered {
        Some(RenderedError(err)) if locale != "en" => error_response(&err, &locale),
        _ => response,
    }
}
