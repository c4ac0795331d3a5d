//! 정책 저장소/감시자 에러.

use sentinel_core::errno::{ERR_CACHE, ERR_CACHE_CONNECTION, ERR_INTERNAL, ERR_VERSION_CONFLICT};
use sentinel_core::Error;
use thiserror::Error as ThisError;

/// 정책 저장소 및 감시자 에러.
#[derive(Debug, ThisError)]
pub enum StoreError {
    /// Redis 연결 에러
    #[error("redis connection failed: {0}")]
    Connection(#[source] redis::RedisError),

    /// Redis 명령 에러
    #[error("redis command failed: {0}")]
    Command(#[source] redis::RedisError),

    /// 저장된 규칙을 해석할 수 없음
    #[error("stored rule {raw:?} is unreadable")]
    Corrupt { raw: String },

    /// 동시 수정으로 재시도 한도 초과
    #[error("policy list changed concurrently, gave up after {attempts} attempts")]
    Contended { attempts: usize },

    /// 닫힌 감시자 사용
    #[error("watcher is closed")]
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
            StoreError::Command(_) | StoreError::Corrupt { .. } => &ERR_CACHE,
            StoreError::Contended { .. } => &ERR_VERSION_CONFLICT,
            StoreError::Closed => &ERR_INTERNAL,
        };
        errno.with_message(err.to_string()).with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contended_maps_to_version_conflict() {
        let err: Error = StoreError::Contended { attempts: 5 }.into();
        assert!(err.is(&ERR_VERSION_CONFLICT));
        assert_eq!(err.http_status(), 409);
    }

    #[test]
    fn test_corrupt_keeps_raw_value() {
        let err: Error = StoreError::Corrupt { raw: ", x".to_string() }.into();
        assert!(err.is(&ERR_CACHE));
        assert!(err.message("en").contains(", x"));
    }
}
