//! 메모리 차단 목록.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result, SharedClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::BlocklistStore;
use crate::error::StoreError;

/// 메모리 차단 목록.
///
/// 만료된 항목은 정리 전에도 없는 것으로 취급하며, 백그라운드 정리 작업이
/// 주기적으로 제거합니다.
#[derive(Clone)]
pub struct MemoryBlocklist {
    inner: Arc<Inner>,
}

struct Inner {
    entries: RwLock<HashMap<String, i64>>,
    clock: SharedClock,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl MemoryBlocklist {
    /// 정리 작업 없이 생성합니다.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                clock,
                closed: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// 주기적 정리 작업과 함께 생성합니다. tokio 런타임 안에서 호출해야 합니다.
    pub fn with_sweeper(clock: SharedClock, interval: Duration) -> Self {
        let blocklist = Self::new(clock);
        let inner = Arc::downgrade(&blocklist.inner);
        let shutdown = blocklist.inner.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = inner.upgrade() else { break };
                        let removed = inner.sweep().await;
                        if removed > 0 {
                            debug!(removed, "Swept expired blocklist entries");
                        }
                    }
                }
            }
        });

        blocklist
    }

    /// 만료된 항목을 제거하고 제거한 수를 반환합니다.
    pub async fn sweep(&self) -> usize {
        self.inner.sweep().await
    }

    /// 보관 중인 항목 수 (만료되었지만 아직 정리되지 않은 항목 포함).
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    /// 항목이 없는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_open(&self) -> std::result::Result<(), StoreError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Inner {
    async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, not_after| *not_after >= now);
        before - entries.len()
    }
}

#[async_trait]
impl BlocklistStore for MemoryBlocklist {
    async fn revoke(&self, ctx: &OpContext, token_id: &str, not_after: i64) -> Result<()> {
        ctx.check()?;
        self.ensure_open()?;

        let mut entries = self.inner.entries.write().await;
        let entry = entries.entry(token_id.to_string()).or_insert(not_after);
        if *entry < not_after {
            *entry = not_after;
        }
        Ok(())
    }

    async fn is_revoked(&self, ctx: &OpContext, token_id: &str) -> Result<bool> {
        ctx.check()?;
        self.ensure_open()?;

        let now = self.inner.clock.now();
        let entries = self.inner.entries.read().await;
        Ok(entries
            .get(token_id)
            .is_some_and(|not_after| *not_after >= now))
    }

    async fn close(&self) -> Result<()> {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.inner.shutdown.cancel();
            self.inner.entries.write().await.clear();
        }
        Ok(())
    }
}
