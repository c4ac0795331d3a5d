//! 작업 컨텍스트.
//!
//! 저장소, 와처 등 블로킹 가능성이 있는 호출은 모두 [`OpContext`]를 받습니다.
//! 컨텍스트는 선택적 마감 시각과 취소 신호를 전달하며, 취소되면
//! `Timeout:ContextCanceled`, 마감을 넘기면 `Timeout:Timeout`으로 중단됩니다.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errno::{ERR_CONTEXT_CANCELED, ERR_TIMEOUT};
use crate::error::{Error, Result};

/// 마감 시각과 취소 신호를 담은 작업 컨텍스트.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl OpContext {
    /// 마감 없는 기본 컨텍스트.
    pub fn background() -> Self {
        Self::default()
    }

    /// 지금부터 `timeout` 후에 만료되는 컨텍스트.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// 외부 취소 토큰에 연결된 컨텍스트.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            deadline: None,
            cancel,
        }
    }

    /// 부모의 취소를 상속하고 더 이른 마감을 가질 수 있는 자식 컨텍스트.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout) {
            (Some(parent), Some(t)) => Some(parent.min(Instant::now() + t)),
            (None, Some(t)) => Some(Instant::now() + t),
            (parent, None) => parent,
        };
        Self {
            deadline,
            cancel: self.cancel.child_token(),
        }
    }

    /// 마감 시각.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 취소 토큰.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 컨텍스트를 취소합니다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 취소 여부.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 이미 취소되었거나 마감이 지났으면 에러를 반환합니다.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(canceled());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(deadline_exceeded());
            }
        }
        Ok(())
    }

    /// 취소 신호와 마감 시각에 맞춰 퓨처를 실행합니다.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(canceled()),
            _ = deadline => Err(deadline_exceeded()),
            result = fut => result,
        }
    }
}

fn canceled() -> Error {
    ERR_CONTEXT_CANCELED.with_message("operation canceled")
}

fn deadline_exceeded() -> Error {
    ERR_TIMEOUT.with_message("operation deadline exceeded")
}
