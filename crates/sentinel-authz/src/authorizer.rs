//! 인가 판정 계약.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};
use std::sync::Arc;

use crate::engine::PolicyEngine;

/// 요청 파이프라인이 사용하는 인가 판정자.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// `(subject, object, action)` 허용 여부.
    async fn authorize(
        &self,
        ctx: &OpContext,
        subject: &str,
        object: &str,
        action: &str,
    ) -> Result<bool>;
}

#[async_trait]
impl Authorizer for PolicyEngine {
    async fn authorize(
        &self,
        ctx: &OpContext,
        subject: &str,
        object: &str,
        action: &str,
    ) -> Result<bool> {
        ctx.check()?;
        Ok(self.enforce(subject, object, action))
    }
}

#[async_trait]
impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    async fn authorize(
        &self,
        ctx: &OpContext,
        subject: &str,
        object: &str,
        action: &str,
    ) -> Result<bool> {
        (**self).authorize(ctx, subject, object, action).await
    }
}
