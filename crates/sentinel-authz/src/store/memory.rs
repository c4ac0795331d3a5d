//! 메모리 정책 저장소.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};
use tokio::sync::RwLock;

use super::{dedup_rules, PolicyStore};
use crate::rule::Rule;

/// 메모리 정책 저장소.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    rules: RwLock<Vec<Rule>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 규칙과 함께 생성합니다.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: RwLock::new(dedup_rules(&rules)),
        }
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load_all(&self, ctx: &OpContext) -> Result<Vec<Rule>> {
        ctx.check()?;
        Ok(self.rules.read().await.clone())
    }

    async fn save_all(&self, ctx: &OpContext, rules: &[Rule]) -> Result<()> {
        ctx.check()?;
        rules.iter().try_for_each(Rule::check_text)?;
        *self.rules.write().await = dedup_rules(rules);
        Ok(())
    }

    async fn add(&self, ctx: &OpContext, rule: &Rule) -> Result<bool> {
        ctx.check()?;
        rule.check_text()?;
        let mut rules = self.rules.write().await;
        if rules.contains(rule) {
            return Ok(false);
        }
        rules.push(rule.clone());
        Ok(true)
    }

    async fn remove(&self, ctx: &OpContext, rule: &Rule) -> Result<bool> {
        ctx.check()?;
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|r| r != rule);
        Ok(rules.len() != before)
    }

    async fn remove_filtered(
        &self,
        ctx: &OpContext,
        ptype: &str,
        field_index: usize,
        field_values: &[&str],
    ) -> Result<usize> {
        ctx.check()?;
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|r| !r.matches_filter(ptype, field_index, field_values));
        Ok(before - rules.len())
    }
}
