//! 정책 변경 감시자.
//!
//! 한 노드의 규칙 변경을 다른 노드에 알립니다. 메시지 내용은 "다시 불러오기"
//! 이상의 의미가 없으며, 같은 알림이 여러 번 전달되어도 안전합니다.

mod local;
mod redis;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sentinel_core::{OpContext, Result};
use std::sync::Arc;

pub use self::local::LocalWatcher;
pub use self::redis::RedisWatcher;

/// 알림 수신 시 호출되는 콜백.
pub type ReloadCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// 변경 감시자 계약.
#[async_trait]
pub trait Watcher: Send + Sync {
    /// 다른 노드에 변경을 알립니다.
    async fn publish(&self, ctx: &OpContext) -> Result<()>;

    /// 다른 노드의 알림마다 `callback`을 호출하는 구독 작업을 시작합니다.
    ///
    /// 자신이 보낸 알림에는 호출하지 않습니다.
    async fn subscribe(&self, callback: ReloadCallback) -> Result<()>;

    /// 구독 작업을 종료합니다. 여러 번 호출해도 안전합니다.
    async fn close(&self) -> Result<()>;
}
