//! 요청 파이프라인 메트릭 헬퍼.
//!
//! 레코더 설치는 바이너리 책임입니다. 레코더가 없으면 기록은 무시됩니다.

use metrics::{counter, histogram};

/// 인증 결과 카운터 증가.
///
/// `result`: `ok`, `skipped`, `missing`, 또는 실패 에러 코드.
pub fn record_auth(result: &str) {
    counter!("auth_requests_total", "result" => result.to_string()).increment(1);
}

/// 인가 판정 카운터 증가 (`allow`, `deny`, `error`).
pub fn record_authz(decision: &'static str) {
    counter!("authz_decisions_total", "decision" => decision).increment(1);
}

/// 인가 판정 소요 시간 기록.
pub fn record_authz_duration(duration_secs: f64) {
    histogram!("authz_decision_duration_seconds").record(duration_secs);
}
