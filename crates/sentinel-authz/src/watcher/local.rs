//! 프로세스 내 감시자.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{ReloadCallback, Watcher};
use crate::error::StoreError;

const CHANNEL_CAPACITY: usize = 64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// 브로드캐스트 채널 기반 감시자.
///
/// 복제본은 같은 채널을 공유하는 별도 참여자이므로, 한 프로세스 안의
/// 여러 엔진이 서로의 변경을 수신할 수 있습니다.
pub struct LocalWatcher {
    id: u64,
    sender: broadcast::Sender<u64>,
    shutdown: CancellationToken,
    closed: AtomicBool,
}

impl LocalWatcher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self::with_sender(sender)
    }

    fn with_sender(sender: broadcast::Sender<u64>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            sender,
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }
}

impl Default for LocalWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LocalWatcher {
    fn clone(&self) -> Self {
        Self::with_sender(self.sender.clone())
    }
}

impl std::fmt::Debug for LocalWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWatcher")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl Watcher for LocalWatcher {
    async fn publish(&self, ctx: &OpContext) -> Result<()> {
        ctx.check()?;
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed.into());
        }
        // 수신자가 없으면 보낼 대상도 없습니다.
        let _ = self.sender.send(self.id);
        Ok(())
    }

    async fn subscribe(&self, callback: ReloadCallback) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed.into());
        }

        let mut receiver = self.sender.subscribe();
        let shutdown = self.shutdown.clone();
        let own_id = self.id;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    message = receiver.recv() => match message {
                        Ok(origin) if origin == own_id => continue,
                        Ok(origin) => {
                            debug!(watcher = own_id, origin, "Policy change received");
                            callback().await;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(watcher = own_id, skipped, "Policy notifications lagged, reloading");
                            callback().await;
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!(watcher = own_id, "Local watcher subscription stopped");
        });

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shutdown.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_callback(counter: Arc<AtomicUsize>) -> ReloadCallback {
        Arc::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_peer_receives_publish() {
        let a = LocalWatcher::new();
        let b = a.clone();
        let received = Arc::new(AtomicUsize::new(0));
        b.subscribe(counting_callback(received.clone())).await.unwrap();

        a.publish(&OpContext::background()).await.unwrap();
        wait_for(&received, 1).await;
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_own_publish_is_ignored() {
        let a = LocalWatcher::new();
        let b = a.clone();
        let own = Arc::new(AtomicUsize::new(0));
        let peer = Arc::new(AtomicUsize::new(0));
        a.subscribe(counting_callback(own.clone())).await.unwrap();
        b.subscribe(counting_callback(peer.clone())).await.unwrap();

        a.publish(&OpContext::background()).await.unwrap();
        wait_for(&peer, 1).await;
        assert_eq!(peer.load(Ordering::SeqCst), 1);
        assert_eq!(own.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_close_stops_subscription() {
        let a = LocalWatcher::new();
        let b = a.clone();
        let received = Arc::new(AtomicUsize::new(0));
        b.subscribe(counting_callback(received.clone())).await.unwrap();

        b.close().await.unwrap();
        b.close().await.unwrap();
        tokio::task::yield_now().await;

        a.publish(&OpContext::background()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(received.load(Ordering::SeqCst), 0);
        assert!(b.publish(&OpContext::background()).await.is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let watcher = LocalWatcher::new();
        assert!(watcher.publish(&OpContext::background()).await.is_ok());
    }
}
