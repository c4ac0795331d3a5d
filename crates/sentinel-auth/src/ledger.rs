//! 갱신 세대 원장.
//!
//! 최초 발급 이후 몇 번 갱신되었는지를 토큰 ID별로 기록합니다.
//! 최초 발급 토큰은 원장에 없으며 세대 0으로 취급합니다.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result, SharedClock};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 갱신 세대 원장 계약.
#[async_trait]
pub trait RefreshLedger: Send + Sync {
    /// 토큰 ID의 세대. 기록이 없으면 0.
    async fn generation(&self, ctx: &OpContext, token_id: &str) -> Result<u32>;

    /// 새 토큰 ID의 세대를 `not_after`까지 기록합니다.
    async fn record(
        &self,
        ctx: &OpContext,
        token_id: &str,
        generation: u32,
        not_after: i64,
    ) -> Result<()>;
}

/// 메모리 갱신 원장.
pub struct MemoryRefreshLedger {
    entries: RwLock<HashMap<String, (u32, i64)>>,
    clock: SharedClock,
}

impl MemoryRefreshLedger {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// 기록된 항목 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 기록이 없는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RefreshLedger for MemoryRefreshLedger {
    async fn generation(&self, ctx: &OpContext, token_id: &str) -> Result<u32> {
        ctx.check()?;
        let now = self.clock.now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(token_id)
            .filter(|(_, not_after)| *not_after >= now)
            .map(|(generation, _)| *generation)
            .unwrap_or(0))
    }

    async fn record(
        &self,
        ctx: &OpContext,
        token_id: &str,
        generation: u32,
        not_after: i64,
    ) -> Result<()> {
        ctx.check()?;
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        // 기록 시점에 만료 항목을 함께 정리합니다.
        entries.retain(|_, (_, expires)| *expires >= now);
        entries.insert(token_id.to_string(), (generation, not_after));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::ManualClock;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unknown_token_is_generation_zero() {
        let ledger = MemoryRefreshLedger::new(Arc::new(ManualClock::new(0)));
        let ctx = OpContext::background();
        assert_eq!(ledger.generation(&ctx, "nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_and_prune() {
        let clock = Arc::new(ManualClock::new(100));
        let ledger = MemoryRefreshLedger::new(clock.clone());
        let ctx = OpContext::background();

        ledger.record(&ctx, "a", 1, 150).await.unwrap();
        ledger.record(&ctx, "b", 2, 500).await.unwrap();
        assert_eq!(ledger.generation(&ctx, "a").await.unwrap(), 1);
        assert_eq!(ledger.generation(&ctx, "b").await.unwrap(), 2);

        clock.set(200);
        assert_eq!(ledger.generation(&ctx, "a").await.unwrap(), 0);
        ledger.record(&ctx, "c", 3, 600).await.unwrap();
        assert_eq!(ledger.len().await, 2);
    }
}
