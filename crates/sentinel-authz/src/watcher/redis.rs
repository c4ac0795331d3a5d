//! Redis pub/sub 감시자.

use async_trait::async_trait;
use futures::StreamExt;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use sentinel_core::{OpContext, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{ReloadCallback, Watcher};
use crate::error::StoreError;

/// Redis 채널 기반 감시자.
///
/// 알림 내용은 발신 인스턴스 ID이며, 자신이 보낸 알림만 건너뜁니다.
/// 그 외 비어 있지 않은 메시지는 모두 다시 불러오기로 취급합니다.
pub struct RedisWatcher {
    client: Client,
    connection: Arc<RwLock<MultiplexedConnection>>,
    channel: String,
    instance_id: String,
    shutdown: CancellationToken,
    closed: AtomicBool,
}

impl RedisWatcher {
    /// Redis에 연결합니다.
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self> {
        let channel = channel.into();
        info!(channel = %channel, "Connecting policy watcher to Redis...");

        let client = Client::open(url).map_err(StoreError::Connection)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Connection)?;

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(connection)),
            channel,
            instance_id: uuid::Uuid::new_v4().simple().to_string(),
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> std::result::Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

/// 자신이 보낸 알림인지 확인합니다. 빈 메시지는 무시합니다.
fn should_reload(payload: &str, instance_id: &str) -> bool {
    !payload.is_empty() && payload != instance_id
}

#[async_trait]
impl Watcher for RedisWatcher {
    #[instrument(skip(self, ctx), fields(channel = %self.channel))]
    async fn publish(&self, ctx: &OpContext) -> Result<()> {
        self.ensure_open()?;
        ctx.run(async {
            let mut conn = self.connection.write().await;
            let receivers: i64 = conn
                .publish(&self.channel, &self.instance_id)
                .await
                .map_err(StoreError::from)?;
            debug!(receivers, "Policy change published");
            Ok(())
        })
        .await
    }

    async fn subscribe(&self, callback: ReloadCallback) -> Result<()> {
        self.ensure_open()?;

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(StoreError::Connection)?;
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(StoreError::from)?;

        let shutdown = self.shutdown.clone();
        let instance_id = self.instance_id.clone();
        let channel = self.channel.clone();

        tokio::spawn(async move {
            let mut messages = Box::pin(pubsub.into_on_message());
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    message = messages.next() => match message {
                        Some(message) => {
                            let payload: String = message.get_payload().unwrap_or_default();
                            if should_reload(&payload, &instance_id) {
                                debug!(channel = %channel, "Policy change received");
                                callback().await;
                            }
                        }
                        None => {
                            warn!(channel = %channel, "Policy watcher subscription ended");
                            break;
                        }
                    },
                }
            }
            debug!(channel = %channel, "Redis watcher subscription stopped");
        });

        info!(channel = %self.channel, "Policy watcher subscribed");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shutdown.cancel();
        }
        Ok(())
    }
}
