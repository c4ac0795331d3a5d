//! Redis 정책 저장소.
//!
//! 규칙을 텍스트 형식으로 리스트 키 하나에 저장합니다. 부분 수정은
//! `WATCH`/`MULTI` 기반 비교 후 교체(CAS)로 처리합니다.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use sentinel_core::{OpContext, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::{dedup_rules, PolicyStore};
use crate::error::StoreError;
use crate::rule::Rule;

/// CAS 재시도 한도.
const MAX_CAS_ATTEMPTS: usize = 8;

/// Redis 정책 저장소 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisPolicyStoreConfig {
    /// Redis URL
    pub url: String,
    /// 규칙 리스트 키
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    "sentinel:policy".to_string()
}

impl Default for RedisPolicyStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            key: default_key(),
        }
    }
}

/// Redis 정책 저장소.
#[derive(Clone)]
pub struct RedisPolicyStore {
    client: Client,
    connection: Arc<RwLock<MultiplexedConnection>>,
    key: String,
}

impl RedisPolicyStore {
    /// Redis에 연결합니다.
    pub async fn connect(config: &RedisPolicyStoreConfig) -> Result<Self> {
        info!(key = %config.key, "Connecting policy store to Redis...");

        let client = Client::open(config.url.as_str()).map_err(StoreError::Connection)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Connection)?;

        info!("Policy store Redis connection established");

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(connection)),
            key: config.key.clone(),
        })
    }

    /// 리스트를 읽고 `mutate`로 수정한 뒤, 그 사이 변경이 없었을 때만 교체합니다.
    ///
    /// WATCH는 연결 단위이므로 CAS마다 전용 연결을 엽니다. 수정 결과가
    /// 원본과 같으면 쓰지 않습니다.
    async fn compare_and_swap<T, F>(&self, mut mutate: F) -> std::result::Result<T, StoreError>
    where
        F: FnMut(&mut Vec<Rule>) -> T,
    {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let _: () = redis::cmd("WATCH").arg(&self.key).query_async(&mut conn).await?;

            let raw: Vec<String> = conn.lrange(&self.key, 0, -1).await?;
            let original = decode_rules(&raw)?;
            let mut rules = original.clone();
            let outcome = mutate(&mut rules);

            if rules == original {
                let _: () = redis::cmd("UNWATCH").query_async(&mut conn).await?;
                return Ok(outcome);
            }

            let committed: Option<()> = replace_pipeline(&self.key, &rules)
                .query_async(&mut conn)
                .await?;
            if committed.is_some() {
                return Ok(outcome);
            }
            debug!(attempt, key = %self.key, "Policy list changed during update, retrying");
        }

        warn!(key = %self.key, attempts = MAX_CAS_ATTEMPTS, "Giving up policy list update");
        Err(StoreError::Contended {
            attempts: MAX_CAS_ATTEMPTS,
        })
    }
}

/// 리스트 전체를 교체하는 트랜잭션 파이프라인.
fn replace_pipeline(key: &str, rules: &[Rule]) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic().del(key).ignore();
    if !rules.is_empty() {
        pipe.rpush(key, encode_rules(rules)).ignore();
    }
    pipe
}

fn encode_rules(rules: &[Rule]) -> Vec<String> {
    rules.iter().map(Rule::to_string).collect()
}

fn decode_rules(raw: &[String]) -> std::result::Result<Vec<Rule>, StoreError> {
    raw.iter()
        .map(|line| {
            line.parse::<Rule>()
                .map_err(|_| StoreError::Corrupt { raw: line.clone() })
        })
        .collect()
}

#[async_trait]
impl PolicyStore for RedisPolicyStore {
    #[instrument(skip(self, ctx), fields(key = %self.key))]
    async fn load_all(&self, ctx: &OpContext) -> Result<Vec<Rule>> {
        ctx.run(async {
            let mut conn = self.connection.write().await;
            let raw: Vec<String> = conn.lrange(&self.key, 0, -1).await.map_err(StoreError::from)?;
            Ok(decode_rules(&raw)?)
        })
        .await
    }

    #[instrument(skip(self, ctx, rules), fields(key = %self.key, count = rules.len()))]
    async fn save_all(&self, ctx: &OpContext, rules: &[Rule]) -> Result<()> {
        rules.iter().try_for_each(Rule::check_text)?;
        let rules = dedup_rules(rules);
        ctx.run(async {
            let mut conn = self.connection.write().await;
            let _: () = replace_pipeline(&self.key, &rules)
                .query_async(&mut *conn)
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, ctx, rule), fields(key = %self.key, rule = %rule))]
    async fn add(&self, ctx: &OpContext, rule: &Rule) -> Result<bool> {
        rule.check_text()?;
        ctx.run(async {
            let added = self
                .compare_and_swap(|rules| {
                    if rules.contains(rule) {
                        false
                    } else {
                        rules.push(rule.clone());
                        true
                    }
                })
                .await?;
            Ok(added)
        })
        .await
    }

    #[instrument(skip(self, ctx, rule), fields(key = %self.key, rule = %rule))]
    async fn remove(&self, ctx: &OpContext, rule: &Rule) -> Result<bool> {
        ctx.run(async {
            let removed = self
                .compare_and_swap(|rules| {
                    let before = rules.len();
                    rules.retain(|r| r != rule);
                    rules.len() != before
                })
                .await?;
            Ok(removed)
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(key = %self.key))]
    async fn remove_filtered(
        &self,
        ctx: &OpContext,
        ptype: &str,
        field_index: usize,
        field_values: &[&str],
    ) -> Result<usize> {
        ctx.run(async {
            let removed = self
                .compare_and_swap(|rules| {
                    let before = rules.len();
                    rules.retain(|r| !r.matches_filter(ptype, field_index, field_values));
                    before - rules.len()
                })
                .await?;
            Ok(removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_rules() {
        let rules = vec![Rule::p("admin", "*", "*"), Rule::g("alice", "admin")];
        let raw = encode_rules(&rules);
        assert_eq!(raw, vec!["p, admin, *, *", "g, alice, admin"]);
        assert_eq!(decode_rules(&raw).unwrap(), rules);
    }

    #[test]
    fn test_encoded_rules_decode_to_same_rules() {
        let rules = vec![
            Rule::new("p", ["alice", "", "read"]).unwrap(),
            Rule::new("p", ["admin", "*", "*", "tenant-1"]).unwrap(),
            Rule::new("g", ["user:42", "role/editor"]).unwrap(),
        ];
        assert_eq!(decode_rules(&encode_rules(&rules)).unwrap(), rules);
    }

    #[test]
    fn test_decode_rejects_corrupt_entry() {
        let raw = vec!["p, a, b, c".to_string(), "   ".to_string()];
        let err = decode_rules(&raw).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref raw } if raw == "   "));
    }

    #[test]
    fn test_config_defaults() {
        let config: RedisPolicyStoreConfig =
            serde_json::from_str(r#"{"url": "redis://cache:6379/2"}"#).unwrap();
        assert_eq!(config.key, "sentinel:policy");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_redis_store_round_trip() {
        let config = RedisPolicyStoreConfig {
            key: format!("sentinel:policy:test:{}", uuid::Uuid::new_v4()),
            ..Default::default()
        };
        let store = RedisPolicyStore::connect(&config).await.unwrap();
        let ctx = OpContext::background();

        assert!(store.add(&ctx, &Rule::p("editor", "posts", "read")).await.unwrap());
        assert!(!store.add(&ctx, &Rule::p("editor", "posts", "read")).await.unwrap());
        assert!(store.add(&ctx, &Rule::g("bob", "editor")).await.unwrap());
        assert_eq!(store.remove_filtered(&ctx, "g", 0, &["bob"]).await.unwrap(), 1);
        assert_eq!(store.load_all(&ctx).await.unwrap().len(), 1);

        store.save_all(&ctx, &[]).await.unwrap();
        assert!(store.load_all(&ctx).await.unwrap().is_empty());
    }
}
