//! Sentinel 인가 모듈.
//!
//! 정책 규칙과 저장소, 노드 간 변경 감시자, RBAC 정책 엔진을 제공합니다.
//!
//! # 구성
//!
//! - [`rule`]: `p`/`g` 규칙 튜플과 텍스트 형식
//! - [`store`]: 규칙 저장소 (메모리, Redis)
//! - [`watcher`]: 변경 알림 (프로세스 내 브로드캐스트, Redis pub/sub)
//! - [`engine`]: 역할 상속과 와일드카드를 지원하는 판정 엔진
//! - [`cache`]: 판정 결과 TTL 캐시

pub mod authorizer;
pub mod cache;
pub mod engine;
pub mod error;
pub mod rule;
pub mod store;
pub mod watcher;

pub use authorizer::Authorizer;
pub use cache::CachedAuthorizer;
pub use engine::{PolicyEngine, PolicyEngineConfig};
pub use error::StoreError;
pub use rule::{parse_rules, Rule, MAX_VALUES, PTYPE_GROUPING, PTYPE_POLICY, WILDCARD};
pub use store::{MemoryPolicyStore, PolicyStore, RedisPolicyStore, RedisPolicyStoreConfig};
pub use watcher::{LocalWatcher, RedisWatcher, ReloadCallback, Watcher};
