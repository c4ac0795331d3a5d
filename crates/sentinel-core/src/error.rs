//! 에러 인스턴스.
//!
//! 등록된 [`Errno`] 핸들에 덮어쓴 메시지와 감싼 원인을 더한 값입니다.
//! 계층 간에 전달되는 유일한 에러 타입이며, 파이프라인 경계에서
//! 에러 봉투(`{code, message, data}`)로 변환됩니다.

use std::borrow::Cow;
use std::fmt;

use crate::errno::{Errno, RpcCode, ERR_INTERNAL};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 코드가 붙은 에러.
pub struct Error {
    errno: &'static Errno,
    message: Option<String>,
    source: Option<BoxError>,
}

/// sentinel 작업을 위한 Result 타입.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// 기본 메시지를 가진 에러를 생성합니다.
    pub fn new(errno: &'static Errno) -> Self {
        Self {
            errno,
            message: None,
            source: None,
        }
    }

    /// 메시지를 덮어씁니다.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 원인을 감쌉니다.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(cause));
        self
    }

    /// 박싱된 원인을 감쌉니다.
    pub fn with_boxed_cause(mut self, cause: BoxError) -> Self {
        self.source = Some(cause);
        self
    }

    /// 등록된 코드 핸들.
    pub fn errno(&self) -> &'static Errno {
        self.errno
    }

    /// 패킹된 코드.
    pub fn code(&self) -> i32 {
        self.errno.code()
    }

    /// HTTP 상태.
    pub fn http_status(&self) -> u16 {
        self.errno.http_status()
    }

    /// RPC 상태.
    pub fn rpc_status(&self) -> RpcCode {
        self.errno.rpc_status()
    }

    /// 로케일에 맞는 메시지.
    ///
    /// 덮어쓴 메시지가 있으면 로케일과 무관하게 그 메시지를 반환합니다.
    pub fn message(&self, locale: &str) -> Cow<'_, str> {
        match &self.message {
            Some(message) => Cow::Borrowed(message.as_str()),
            None => Cow::Borrowed(self.errno.message(locale)),
        }
    }

    /// 감싼 원인을 꺼냅니다.
    pub fn unwrap_cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// 원인을 소유권과 함께 꺼냅니다.
    pub fn into_cause(self) -> Option<BoxError> {
        self.source
    }

    /// 이 에러가 주어진 코드인지 확인합니다 (감싼 체인은 보지 않음).
    pub fn is(&self, errno: &Errno) -> bool {
        self.code() == errno.code()
    }

    /// 임의의 에러를 코드가 붙은 에러로 변환합니다.
    ///
    /// 이미 [`Error`]이면 그대로 반환하고, 그렇지 않으면 원인을 보존한 채
    /// `Internal`로 감쌉니다.
    pub fn from_any(err: BoxError) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => *err,
            Err(other) => ERR_INTERNAL.error().with_boxed_cause(other),
        }
    }
}

/// 에러 체인을 따라가며 주어진 코드가 있는지 확인합니다.
pub fn is_code(err: &(dyn std::error::Error + 'static), errno: &Errno) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(coded) = err.downcast_ref::<Error>() {
            if coded.is(errno) {
                return true;
            }
        }
        current = err.source();
    }
    false
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}: {}", self.code(), self.message("en"))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Error");
        debug
            .field("code", &self.code())
            .field("message", &self.message("en"));
        if let Some(source) = &self.source {
            debug.field("source", source);
        }
        debug.finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<&'static Errno> for Error {
    fn from(errno: &'static Errno) -> Self {
        Error::new(errno)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => err,
            Err(other) => Error::from_any(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errno::{
        ERR_DB_QUERY, ERR_INVALID_TOKEN, ERR_NOT_FOUND, ERR_TOKEN_EXPIRED, ERR_UNAUTHORIZED,
    };

    #[derive(Debug, thiserror::Error)]
    #[error("wrapper: {inner}")]
    struct Wrapper {
        #[source]
        inner: Error,
    }

    #[test]
    fn test_error_string_format() {
        let err = ERR_TOKEN_EXPIRED.error();
        assert_eq!(err.to_string(), "errno 2002: Token expired");

        let err = ERR_NOT_FOUND.with_message("post 42 not found");
        assert_eq!(err.to_string(), "errno 4000: post 42 not found");
    }

    #[test]
    fn test_message_override_wins_over_locale() {
        let err = ERR_UNAUTHORIZED.error();
        assert_eq!(err.message("zh-TW"), "未认证");
        assert_eq!(err.message("en"), "Unauthorized");

        let err = ERR_UNAUTHORIZED.with_message("missing authentication token");
        assert_eq!(err.message("zh"), "missing authentication token");
    }

    #[test]
    fn test_status_accessors() {
        let err = ERR_INVALID_TOKEN.error();
        assert_eq!(err.http_status(), 401);
        assert_eq!(err.rpc_status(), RpcCode::Unauthenticated);
    }

    #[test]
    fn test_with_cause_exposes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = ERR_DB_QUERY.with_cause(io);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk gone");
        assert!(err.unwrap_cause().is_some());
    }

    #[test]
    fn test_is_code_walks_chain() {
        let wrapped = Wrapper {
            inner: ERR_TOKEN_EXPIRED.error(),
        };
        assert!(is_code(&wrapped, &ERR_TOKEN_EXPIRED));
        assert!(!is_code(&wrapped, &ERR_INVALID_TOKEN));

        let nested = ERR_UNAUTHORIZED.with_cause(ERR_TOKEN_EXPIRED.error());
        assert!(is_code(&nested, &ERR_UNAUTHORIZED));
        assert!(is_code(&nested, &ERR_TOKEN_EXPIRED));
    }

    #[test]
    fn test_from_any_keeps_existing_code() {
        let boxed: BoxError = Box::new(ERR_TOKEN_EXPIRED.with_message("late"));
        let err = Error::from_any(boxed);
        assert!(err.is(&ERR_TOKEN_EXPIRED));
        assert_eq!(err.message("en"), "late");
    }

    #[test]
    fn test_from_any_wraps_foreign_error_as_internal() {
        let boxed: BoxError = Box::new(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = Error::from_any(boxed);
        assert!(err.is(&ERR_INTERNAL));
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.into_cause().unwrap().to_string(), "boom");
    }

    #[test]
    fn test_from_anyhow() {
        let err: Error = anyhow::Error::new(ERR_NOT_FOUND.error()).into();
        assert!(err.is(&ERR_NOT_FOUND));

        let err: Error = anyhow::anyhow!("plain failure").into();
        assert!(err.is(&ERR_INTERNAL));
    }
}
