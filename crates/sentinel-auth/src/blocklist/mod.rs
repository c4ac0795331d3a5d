//! 토큰 폐기 차단 목록.
//!
//! 토큰 ID를 `not_after` 시각까지 보관하며, 그 이후의 항목은 없는 것으로
//! 취급합니다. `is_revoked`는 동시 `revoke`와 함께 호출해도 안전해야 합니다.

mod memory;
mod redis;

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};

pub use self::memory::MemoryBlocklist;
pub use self::redis::{RedisBlocklist, RedisBlocklistConfig};

/// 차단 목록 저장소 계약.
#[async_trait]
pub trait BlocklistStore: Send + Sync {
    /// 토큰 ID를 `not_after`(Unix timestamp)까지 차단합니다.
    async fn revoke(&self, ctx: &OpContext, token_id: &str, not_after: i64) -> Result<()>;

    /// 토큰 ID가 현재 차단되어 있는지 확인합니다.
    async fn is_revoked(&self, ctx: &OpContext, token_id: &str) -> Result<bool>;

    /// 저장소를 닫고 백그라운드 작업을 종료합니다.
    async fn close(&self) -> Result<()>;
}
