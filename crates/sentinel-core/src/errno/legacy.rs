//! 구 에러 코드 변환 테이블.
//!
//! 개편 이전의 평면 정수 코드를 저장해 둔 호출자를 위해 패킹된 코드와
//! 양방향으로 변환합니다. 테이블에 없는 코드는 그대로 반환됩니다.
//!
//! 구 코드는 정의되지 않은 카테고리(40, 41, 50 등)에 해당하므로
//! 내장 코드와 겹치지 않습니다.

use super::builtin::*;
use super::Errno;

static LEGACY_CODES: &[(i32, &Errno)] = &[
    (40001, &ERR_INVALID_PARAM),
    (40002, &ERR_MISSING_PARAM),
    (40101, &ERR_UNAUTHORIZED),
    (40102, &ERR_INVALID_TOKEN),
    (40103, &ERR_TOKEN_EXPIRED),
    (40301, &ERR_FORBIDDEN),
    (40401, &ERR_NOT_FOUND),
    (50001, &ERR_INTERNAL),
    (50002, &ERR_DATABASE),
    (50301, &ERR_SERVICE_UNAVAILABLE),
];

/// 구 코드를 패킹된 코드로 변환합니다.
pub fn from_legacy(code: i32) -> i32 {
    LEGACY_CODES
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map(|(_, errno)| errno.code())
        .unwrap_or(code)
}

/// 패킹된 코드를 구 코드로 변환합니다.
pub fn to_legacy(code: i32) -> i32 {
    LEGACY_CODES
        .iter()
        .find(|(_, errno)| errno.code() == code)
        .map(|(legacy, _)| *legacy)
        .unwrap_or(code)
}
