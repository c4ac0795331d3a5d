//! 판정 결과 캐시.
//!
//! 같은 `(subject, object, action)` 판정을 TTL 동안 재사용합니다. 에러는
//! 캐시하지 않습니다. 규칙 변경이 즉시 반영되어야 하는 경우 `invalidate*`
//! 또는 `clear`를 호출해야 합니다.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::authorizer::Authorizer;

/// 기본 캐시 TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// 기본 최대 항목 수.
pub const DEFAULT_MAX_SIZE: usize = 10_000;

type DecisionKey = (String, String, String);

#[derive(Debug, Clone, Copy)]
struct Decision {
    allowed: bool,
    stored_at: Instant,
}

/// TTL 판정 캐시를 가진 인가 판정자.
pub struct CachedAuthorizer<A> {
    inner: A,
    ttl: Duration,
    max_size: usize,
    entries: Mutex<HashMap<DecisionKey, Decision>>,
}

impl<A: Authorizer> CachedAuthorizer<A> {
    pub fn new(inner: A) -> Self {
        Self::with_limits(inner, DEFAULT_TTL, DEFAULT_MAX_SIZE)
    }

    /// TTL과 최대 항목 수를 지정합니다. `max_size`가 0이면 캐시하지 않습니다.
    pub fn with_limits(inner: A, ttl: Duration, max_size: usize) -> Self {
        Self {
            inner,
            ttl,
            max_size,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DecisionKey, Decision>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, key: &DecisionKey) -> Option<bool> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(decision) if decision.stored_at.elapsed() < self.ttl => Some(decision.allowed),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: DecisionKey, allowed: bool) {
        if self.max_size == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            // 가장 오래된 항목을 내보냅니다.
            let oldest = entries
                .iter()
                .min_by_key(|(_, decision)| decision.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Decision {
                allowed,
                stored_at: Instant::now(),
            },
        );
    }

    /// 특정 판정을 무효화합니다.
    pub fn invalidate(&self, subject: &str, object: &str, action: &str) {
        self.lock()
            .remove(&(subject.to_string(), object.to_string(), action.to_string()));
    }

    /// 주체의 모든 판정을 무효화합니다.
    pub fn invalidate_subject(&self, subject: &str) {
        self.lock().retain(|(s, _, _), _| s != subject);
    }

    /// 모든 판정을 무효화합니다.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// 캐시된 항목 수 (만료되었지만 아직 제거되지 않은 항목 포함).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<A: Authorizer> Authorizer for CachedAuthorizer<A> {
    async fn authorize(
        &self,
        ctx: &OpContext,
        subject: &str,
        object: &str,
        action: &str,
    ) -> Result<bool> {
        let key = (subject.to_string(), object.to_string(), action.to_string());
        if let Some(allowed) = self.cached(&key) {
            return Ok(allowed);
        }

        let allowed = self.inner.authorize(ctx, subject, object, action).await?;
        self.store(key, allowed);
        Ok(allowed)
    }
}
