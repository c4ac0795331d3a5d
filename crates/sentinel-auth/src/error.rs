//! 저장소 계층 에러.
//!
//! 저장소 구현 내부에서만 쓰이며, 경계에서 코드가 붙은 에러로 변환됩니다.

use sentinel_core::errno::{ERR_CACHE, ERR_CACHE_CONNECTION, ERR_INTERNAL};
use sentinel_core::Error;
use thiserror::Error as ThisError;

/// 차단 목록/갱신 원장 저장소 에러.
#[derive(Debug, ThisError)]
pub enum StoreError {
    /// Redis 연결 에러
    #[error("redis connection failed: {0}")]
    Connection(#[source] redis::RedisError),

    /// Redis 명령 에러
    #[error("redis command failed: {0}")]
    Command(#[source] redis::RedisError),

    /// 닫힌 저장소 사용
    #[error("store is closed")]
    Closed,
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            StoreError::Connection(err)
        } else {
            StoreError::Command(err)
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        let errno = match &err {
            StoreError::Connection(_) => &ERR_CACHE_CONNECTION,
            StoreError::Command(_) => &ERR_CACHE,
            StoreError::Closed => &ERR_INTERNAL,
        };
        errno.with_message(err.to_string()).with_cause(err)
    }
}
