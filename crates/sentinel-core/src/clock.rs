//! 주입 가능한 시계.
//!
//! 모든 시간 비교는 초 단위 유닉스 타임스탬프로 수행합니다.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// 현재 시각 제공자.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// 현재 유닉스 타임스탬프 (초).
    fn now(&self) -> i64;
}

/// 공유 시계 핸들.
pub type SharedClock = Arc<dyn Clock>;

/// 시스템 시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// 시스템 시계 핸들을 생성합니다.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// 테스트용 수동 시계.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// 현재 시스템 시각에서 시작하는 시계.
    pub fn starting_now() -> Self {
        Self::new(Utc::now().timestamp())
    }

    /// 시각을 설정합니다.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// 시각을 앞당깁니다.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        clock.advance(30);
        assert_eq!(clock.now(), 1_030);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_close_to_chrono() {
        let now = SystemClock.now();
        assert!((now - Utc::now().timestamp()).abs() <= 1);
    }
}
