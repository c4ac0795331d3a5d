//! 정책 규칙 저장소.
//!
//! 규칙 전체 목록의 영속화와 원자적 교체를 담당합니다. 규칙에는 순서가
//! 없으며, 같은 규칙은 한 번만 저장됩니다.

mod memory;
mod redis;

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};

use crate::rule::Rule;

pub use self::memory::MemoryPolicyStore;
pub use self::redis::{RedisPolicyStore, RedisPolicyStoreConfig};

/// 정책 저장소 계약.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// 모든 규칙을 불러옵니다.
    async fn load_all(&self, ctx: &OpContext) -> Result<Vec<Rule>>;

    /// 규칙 전체를 원자적으로 교체합니다.
    async fn save_all(&self, ctx: &OpContext, rules: &[Rule]) -> Result<()>;

    /// 규칙을 추가합니다. 새로 추가되었으면 `true`.
    async fn add(&self, ctx: &OpContext, rule: &Rule) -> Result<bool>;

    /// 규칙을 제거합니다. 제거되었으면 `true`.
    async fn remove(&self, ctx: &OpContext, rule: &Rule) -> Result<bool>;

    /// 필터와 일치하는 규칙을 모두 제거하고 제거한 수를 반환합니다.
    ///
    /// 일치 조건은 [`Rule::matches_filter`]를 따릅니다.
    async fn remove_filtered(
        &self,
        ctx: &OpContext,
        ptype: &str,
        field_index: usize,
        field_values: &[&str],
    ) -> Result<usize>;
}

/// 중복을 제거하면서 순서를 유지합니다.
pub(crate) fn dedup_rules(rules: &[Rule]) -> Vec<Rule> {
    let mut seen = std::collections::HashSet::with_capacity(rules.len());
    rules
        .iter()
        .filter(|rule| seen.insert(*rule))
        .cloned()
        .collect()
}
