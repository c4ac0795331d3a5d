//! RBAC 정책 엔진.
//!
//! 규칙 저장소의 내용을 읽기 전용 인덱스로 만들어 두고, `enforce`는 이
//! 인덱스만으로 판정합니다. 인덱스는 다시 불러올 때마다 통째로 교체되므로
//! 동시 판정은 교체 전 또는 교체 후의 완전한 규칙 집합만 보게 됩니다.
//!
//! # 판정 규칙
//!
//! 권한 규칙 `p(sub, obj, act)`는 질의 `(s, o, a)`에 대해 다음을 모두
//! 만족하면 일치합니다.
//!
//! 1. `sub == s` 이거나, 그룹 규칙을 따라 `s`가 역할 `sub`에 도달
//! 2. `obj`가 `*` 이거나 `o`와 같음
//! 3. `act`가 `*` 이거나 `a`와 같음
//!
//! 일치하는 권한 규칙이 하나라도 있으면 허용합니다. 거부 규칙은 없습니다.

use futures::FutureExt;
use metrics::counter;
use sentinel_core::errno::ERR_INVALID_PARAM;
use sentinel_core::{OpContext, Result};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock, Weak};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::rule::{Rule, WILDCARD};
use crate::store::PolicyStore;
use crate::watcher::{ReloadCallback, Watcher};

/// 정책 엔진 설정.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngineConfig {
    /// 모든 권한을 가지는 역할
    pub super_admin: Option<String>,
}

impl PolicyEngineConfig {
    pub fn with_super_admin(mut self, role: impl Into<String>) -> Self {
        self.super_admin = Some(role.into());
        self
    }
}

// =============================================================================
// 규칙 인덱스
// =============================================================================

/// 판정용 읽기 전용 인덱스.
#[derive(Debug, Default)]
struct RuleIndex {
    rules: Vec<Rule>,
    /// 주체 또는 역할 → (객체, 동작) 목록
    permissions: HashMap<String, Vec<(String, String)>>,
    /// 주체 → 그룹 규칙의 추이 폐포 (자기 자신 제외)
    closure: HashMap<String, BTreeSet<String>>,
}

impl RuleIndex {
    fn build(rules: Vec<Rule>) -> Self {
        let mut permissions: HashMap<String, Vec<(String, String)>> = HashMap::new();
        let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();

        for rule in &rules {
            if rule.is_policy() {
                permissions
                    .entry(rule.field(0).to_string())
                    .or_default()
                    .push((rule.field(1).to_string(), rule.field(2).to_string()));
            } else if rule.is_grouping() {
                edges.entry(rule.field(0)).or_default().push(rule.field(1));
            }
        }

        let closure = edges
            .keys()
            .map(|subject| (subject.to_string(), reachable_roles(&edges, subject)))
            .collect();

        Self {
            rules,
            permissions,
            closure,
        }
    }

    fn roles_of(&self, subject: &str) -> Option<&BTreeSet<String>> {
        self.closure.get(subject)
    }

    fn allows(&self, subject: &str, object: &str, action: &str) -> bool {
        self.permissions.get(subject).is_some_and(|grants| {
            grants
                .iter()
                .any(|(obj, act)| match_token(obj, object) && match_token(act, action))
        })
    }
}

/// 너비 우선 탐색으로 도달 가능한 역할을 모읍니다. 순환이 있어도 종료합니다.
fn reachable_roles(edges: &HashMap<&str, Vec<&str>>, start: &str) -> BTreeSet<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        for &next in edges.get(node).into_iter().flatten() {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited.remove(start);
    visited.into_iter().map(str::to_string).collect()
}

fn match_token(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

// =============================================================================
// 엔진
// =============================================================================

/// 정책 엔진.
///
/// 복제해도 같은 인덱스와 저장소를 공유합니다.
#[derive(Clone)]
pub struct PolicyEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<dyn PolicyStore>,
    index: StdRwLock<Arc<RuleIndex>>,
    write_lock: Mutex<()>,
    watcher: RwLock<Option<Arc<dyn Watcher>>>,
    super_admin: Option<String>,
}

impl PolicyEngine {
    /// 빈 인덱스로 엔진을 생성합니다. 저장소 내용은 [`reload`](Self::reload)로 불러옵니다.
    pub fn new(store: Arc<dyn PolicyStore>, config: PolicyEngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                index: StdRwLock::new(Arc::new(RuleIndex::default())),
                write_lock: Mutex::new(()),
                watcher: RwLock::new(None),
                super_admin: config.super_admin,
            }),
        }
    }

    /// 엔진을 생성하고 저장소 내용을 불러옵니다.
    pub async fn load(
        ctx: &OpContext,
        store: Arc<dyn PolicyStore>,
        config: PolicyEngineConfig,
    ) -> Result<Self> {
        let engine = Self::new(store, config);
        engine.reload(ctx).await?;
        Ok(engine)
    }

    fn snapshot(&self) -> Arc<RuleIndex> {
        self.inner
            .index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap_index(&self, index: RuleIndex) {
        *self
            .inner
            .index
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(index);
    }

    // =========================================================================
    // 판정
    // =========================================================================

    /// `(subject, object, action)` 요청을 판정합니다.
    ///
    /// 인자 중 하나라도 비어 있으면 거부합니다.
    pub fn enforce(&self, subject: &str, object: &str, action: &str) -> bool {
        if subject.is_empty() || object.is_empty() || action.is_empty() {
            return false;
        }

        let index = self.snapshot();
        let roles = index.roles_of(subject);

        if let Some(super_admin) = &self.inner.super_admin {
            if subject == super_admin || roles.is_some_and(|r| r.contains(super_admin)) {
                return true;
            }
        }

        index.allows(subject, object, action)
            || roles
                .into_iter()
                .flatten()
                .any(|role| index.allows(role, object, action))
    }

    /// 주체가 가진 모든 역할 (간접 역할 포함).
    pub fn roles_for(&self, subject: &str) -> Vec<String> {
        self.snapshot()
            .roles_of(subject)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 주체가 역할을 (간접적으로라도) 가지는지 확인합니다.
    pub fn has_role(&self, subject: &str, role: &str) -> bool {
        self.snapshot()
            .roles_of(subject)
            .is_some_and(|roles| roles.contains(role))
    }

    /// 현재 인덱스의 규칙 목록.
    pub fn rules(&self) -> Vec<Rule> {
        self.snapshot().rules.clone()
    }

    // =========================================================================
    // 변경
    // =========================================================================

    /// 규칙을 추가합니다. 새로 추가되었으면 `true`.
    pub async fn add_rule(&self, ctx: &OpContext, rule: Rule) -> Result<bool> {
        validate(&rule)?;
        let _guard = self.inner.write_lock.lock().await;

        let added = self.inner.store.add(ctx, &rule).await?;
        if added {
            self.commit_locked(ctx, |rules| {
                if !rules.contains(&rule) {
                    rules.push(rule.clone());
                }
            })
            .await;
            info!(rule = %rule, "Policy rule added");
        }
        Ok(added)
    }

    /// 규칙을 제거합니다. 제거되었으면 `true`.
    pub async fn remove_rule(&self, ctx: &OpContext, rule: Rule) -> Result<bool> {
        let _guard = self.inner.write_lock.lock().await;

        let removed = self.inner.store.remove(ctx, &rule).await?;
        if removed {
            self.commit_locked(ctx, |rules| rules.retain(|r| r != &rule))
                .await;
            info!(rule = %rule, "Policy rule removed");
        }
        Ok(removed)
    }

    /// 사용자에게 역할을 부여합니다.
    pub async fn add_user_role(&self, ctx: &OpContext, user: &str, role: &str) -> Result<bool> {
        self.add_rule(ctx, Rule::g(user, role)).await
    }

    /// 사용자의 역할을 회수합니다.
    pub async fn remove_user_role(&self, ctx: &OpContext, user: &str, role: &str) -> Result<bool> {
        self.remove_rule(ctx, Rule::g(user, role)).await
    }

    /// 필터와 일치하는 규칙을 제거하고 제거한 수를 반환합니다.
    pub async fn remove_filtered(
        &self,
        ctx: &OpContext,
        ptype: &str,
        field_index: usize,
        field_values: &[&str],
    ) -> Result<usize> {
        let _guard = self.inner.write_lock.lock().await;

        let removed = self
            .inner
            .store
            .remove_filtered(ctx, ptype, field_index, field_values)
            .await?;
        if removed > 0 {
            self.commit_locked(ctx, |rules| {
                rules.retain(|r| !r.matches_filter(ptype, field_index, field_values))
            })
            .await;
            info!(ptype, field_index, removed, "Policy rules removed by filter");
        }
        Ok(removed)
    }

    /// 저장소에서 규칙을 다시 불러와 인덱스를 교체합니다.
    pub async fn reload(&self, ctx: &OpContext) -> Result<()> {
        let _guard = self.inner.write_lock.lock().await;
        self.reload_locked(ctx, "manual").await
    }

    async fn reload_locked(&self, ctx: &OpContext, source: &'static str) -> Result<()> {
        let rules = self.inner.store.load_all(ctx).await?;
        let count = rules.len();
        self.swap_index(RuleIndex::build(rules));

        counter!("policy_reloads_total", "source" => source).increment(1);
        debug!(source, rules = count, "Policy index reloaded");
        Ok(())
    }

    /// 저장소 변경이 끝난 뒤 로컬 인덱스를 갱신하고 감시자에 알립니다.
    ///
    /// 저장소를 다시 읽지 못하면 같은 변경(`apply`)을 현재 인덱스에 적용합니다.
    /// 변경은 이미 저장되었으므로 어느 경우든 알림을 보냅니다.
    async fn commit_locked<F>(&self, ctx: &OpContext, apply: F)
    where
        F: FnOnce(&mut Vec<Rule>),
    {
        if let Err(e) = self.reload_locked(ctx, "local").await {
            warn!(error = %e, "Failed to reload policies after write, applying change locally");
            let mut rules = self.snapshot().rules.clone();
            apply(&mut rules);
            self.swap_index(RuleIndex::build(rules));
        }
        self.notify(ctx).await;
    }

    /// 감시자에 변경을 알립니다. 실패는 경고만 남깁니다.
    async fn notify(&self, ctx: &OpContext) {
        let watcher = self.inner.watcher.read().await.clone();
        if let Some(watcher) = watcher {
            if let Err(e) = watcher.publish(ctx).await {
                warn!(error = %e, "Failed to publish policy change");
            }
        }
    }

    // =========================================================================
    // 감시자
    // =========================================================================

    /// 감시자를 연결합니다. 기존 감시자는 닫힙니다.
    ///
    /// 다른 노드의 알림을 받으면 이 엔진이 규칙을 다시 불러옵니다.
    pub async fn set_watcher(&self, watcher: Arc<dyn Watcher>) -> Result<()> {
        let weak: Weak<EngineInner> = Arc::downgrade(&self.inner);
        let callback: ReloadCallback = Arc::new(move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else { return };
                let engine = PolicyEngine { inner };
                let _guard = engine.inner.write_lock.lock().await;
                if let Err(e) = engine.reload_locked(&OpContext::background(), "watcher").await {
                    warn!(error = %e, "Failed to reload policy after change notification");
                }
            }
            .boxed()
        });

        watcher.subscribe(callback).await?;

        let previous = self.inner.watcher.write().await.replace(watcher);
        if let Some(previous) = previous {
            previous.close().await?;
        }
        info!("Policy watcher attached");
        Ok(())
    }

    /// 감시자를 분리하고 닫습니다.
    pub async fn close(&self) -> Result<()> {
        let watcher = self.inner.watcher.write().await.take();
        if let Some(watcher) = watcher {
            watcher.close().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("rules", &self.snapshot().rules.len())
            .field("super_admin", &self.inner.super_admin)
            .finish_non_exhaustive()
    }
}

/// 권한/그룹 규칙의 필수 필드를 확인합니다.
fn validate(rule: &Rule) -> Result<()> {
    rule.check_text()?;
    let required = if rule.is_policy() {
        3
    } else if rule.is_grouping() {
        2
    } else {
        return Ok(());
    };

    if (0..required).any(|i| rule.field(i).is_empty()) {
        return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
            "rule {} is missing required fields",
            rule
        )));
    }
    Ok(())
}
