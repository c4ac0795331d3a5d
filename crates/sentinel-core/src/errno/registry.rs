//! 에러 코드 레지스트리.
//!
//! 패킹된 코드의 프로세스 전역 유일성을 보장합니다. 등록은 로드 시점에
//! 한 번 일어나며, 같은 속성으로 재등록하면 기존 핸들을 돌려주고
//! 다른 속성으로 재등록하면 에러를 반환합니다.

use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::RwLock;

use super::builtin::{BUILTINS, ERR_ALREADY_EXISTS, ERR_INVALID_PARAM};
use super::{make_code, Category, Errno, RpcCode};
use crate::error::Result;

/// 공통 서비스 번호.
pub const COMMON_SERVICE: i32 = 0;

/// 에러 코드 레지스트리.
pub struct ErrnoRegistry {
    codes: RwLock<HashMap<i32, &'static Errno>>,
    services: RwLock<HashMap<i32, String>>,
}

impl std::fmt::Debug for ErrnoRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrnoRegistry")
            .field("codes", &self.len())
            .finish()
    }
}

impl Default for ErrnoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrnoRegistry {
    /// 내장 코드와 공통 서비스가 등록된 레지스트리를 생성합니다.
    pub fn new() -> Self {
        let codes = BUILTINS.iter().map(|e| (e.code(), *e)).collect();
        let services = HashMap::from([(COMMON_SERVICE, "common".to_string())]);
        Self {
            codes: RwLock::new(codes),
            services: RwLock::new(services),
        }
    }

    /// 에러 코드를 등록합니다.
    ///
    /// 같은 코드가 같은 속성으로 이미 등록되어 있으면 기존 핸들을 반환합니다.
    /// 다른 속성으로 등록되어 있으면 `Conflict:AlreadyExists`를 반환합니다.
    pub fn register(&self, errno: Errno) -> Result<&'static Errno> {
        let mut codes = self.codes.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = codes.get(&errno.code()) {
            if existing.same_attributes(&errno) {
                return Ok(existing);
            }
            return Err(ERR_ALREADY_EXISTS.with_formatted_message(format_args!(
                "error code {} already registered with different attributes",
                errno.code()
            )));
        }

        if errno.code() != 0 && errno.category() == Some(Category::Success) {
            return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "error code {} uses the success category",
                errno.code()
            )));
        }

        // 등록은 로드 시점에만 일어나므로 핸들은 프로세스 수명 동안 유지됩니다.
        let handle: &'static Errno = Box::leak(Box::new(errno));
        codes.insert(handle.code(), handle);
        Ok(handle)
    }

    /// 코드로 핸들을 조회합니다.
    pub fn lookup(&self, code: i32) -> Option<&'static Errno> {
        self.codes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&code)
            .copied()
    }

    /// 등록된 코드 수.
    pub fn len(&self) -> usize {
        self.codes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 등록된 코드가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // 서비스 등록
    // =========================================================================

    /// 서비스 번호에 이름을 등록합니다.
    ///
    /// 같은 이름의 재등록은 무시되고, 다른 이름이면 에러를 반환합니다.
    pub fn register_service(&self, service: i32, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !(0..=super::MAX_SERVICE).contains(&service) {
            return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "service {} out of range [0, {}]",
                service,
                super::MAX_SERVICE
            )));
        }
        if name.is_empty() {
            return Err(ERR_INVALID_PARAM.with_message("service name is required"));
        }

        let mut services = self.services.write().unwrap_or_else(|e| e.into_inner());
        match services.get(&service) {
            Some(existing) if *existing == name => Ok(()),
            Some(existing) => Err(ERR_ALREADY_EXISTS.with_formatted_message(format_args!(
                "service {} already registered as {}",
                service, existing
            ))),
            None => {
                services.insert(service, name);
                Ok(())
            }
        }
    }

    /// 서비스 이름을 조회합니다.
    pub fn service_name(&self, service: i32) -> Option<String> {
        self.services
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&service)
            .cloned()
    }

    /// 카테고리의 기본 HTTP/RPC 상태로 에러 코드를 생성하고 등록합니다.
    pub fn new_error(
        &self,
        category: Category,
        service: i32,
        sequence: i32,
        message_en: impl Into<Cow<'static, str>>,
        message_zh: Option<&'static str>,
    ) -> Result<&'static Errno> {
        ErrnoBuilder::new(service, category.number(), sequence)
            .message(message_en, message_zh)
            .register_in(self)
    }
}

static REGISTRY: Lazy<ErrnoRegistry> = Lazy::new(ErrnoRegistry::new);

/// 프로세스 전역 레지스트리.
pub fn registry() -> &'static ErrnoRegistry {
    &REGISTRY
}

/// 전역 레지스트리에 에러 코드를 등록합니다.
pub fn register(errno: Errno) -> Result<&'static Errno> {
    registry().register(errno)
}

/// 전역 레지스트리에서 조회합니다.
pub fn lookup(code: i32) -> Option<&'static Errno> {
    registry().lookup(code)
}

/// 전역 레지스트리에 서비스를 등록합니다.
pub fn register_service(service: i32, name: impl Into<String>) -> Result<()> {
    registry().register_service(service, name)
}

/// 전역 레지스트리에서 서비스 이름을 조회합니다.
pub fn service_name(service: i32) -> Option<String> {
    registry().service_name(service)
}

macro_rules! category_factory {
    ($(#[$doc:meta] $name:ident => $category:ident),* $(,)?) => {
        $(
            #[$doc]
            pub fn $name(
                service: i32,
                sequence: i32,
                message_en: impl Into<Cow<'static, str>>,
                message_zh: Option<&'static str>,
            ) -> Result<&'static Errno> {
                registry().new_error(Category::$category, service, sequence, message_en, message_zh)
            }
        )*
    };
}

category_factory! {
    /// 요청 에러 (400, invalid-argument).
    new_request_error => Request,
    /// 인증 에러 (401, unauthenticated).
    new_auth_error => Auth,
    /// 권한 에러 (403, permission-denied).
    new_permission_error => Permission,
    /// 리소스 에러 (404, not-found).
    new_resource_error => Resource,
    /// 충돌 에러 (409, already-exists).
    new_conflict_error => Conflict,
    /// 요청 한도 에러 (429, resource-exhausted).
    new_rate_limit_error => RateLimit,
    /// 내부 에러 (500, internal).
    new_internal_error => Internal,
    /// 데이터베이스 에러 (500, internal).
    new_database_error => Database,
    /// 캐시 에러 (500, internal).
    new_cache_error => Cache,
    /// 네트워크 에러 (503, unavailable).
    new_network_error => Network,
    /// 타임아웃 에러 (504, deadline-exceeded).
    new_timeout_error => Timeout,
    /// 설정 에러 (500, internal).
    new_config_error => Config,
}

/// 에러 코드 빌더.
///
/// 카테고리 팩토리와 같은 등록 경로를 사용합니다.
///
/// ```
/// use sentinel_core::errno::ErrnoBuilder;
///
/// let errno = ErrnoBuilder::new(42, 4, 7)
///     .http(410)
///     .message("Order gone", Some("订单已删除"))
///     .build()
///     .unwrap();
/// assert_eq!(errno.code(), 4_204_007);
/// assert_eq!(errno.http_status(), 410);
/// ```
#[derive(Debug, Clone)]
pub struct ErrnoBuilder {
    service: i32,
    category: i32,
    sequence: i32,
    http: Option<u16>,
    rpc: Option<RpcCode>,
    message_en: Cow<'static, str>,
    message_zh: Option<Cow<'static, str>>,
}

impl ErrnoBuilder {
    pub fn new(service: i32, category: i32, sequence: i32) -> Self {
        Self {
            service,
            category,
            sequence,
            http: None,
            rpc: None,
            message_en: Cow::Borrowed(""),
            message_zh: None,
        }
    }

    /// HTTP 상태를 지정합니다.
    pub fn http(mut self, status: u16) -> Self {
        self.http = Some(status);
        self
    }

    /// RPC 상태를 지정합니다.
    pub fn rpc(mut self, code: RpcCode) -> Self {
        self.rpc = Some(code);
        self
    }

    /// 영어/현지화 메시지를 지정합니다.
    pub fn message(
        mut self,
        message_en: impl Into<Cow<'static, str>>,
        message_zh: Option<&'static str>,
    ) -> Self {
        self.message_en = message_en.into();
        self.message_zh = message_zh.map(Cow::Borrowed);
        self
    }

    /// 전역 레지스트리에 등록합니다.
    pub fn build(self) -> Result<&'static Errno> {
        self.register_in(registry())
    }

    /// 지정한 레지스트리에 등록합니다.
    pub fn register_in(self, registry: &ErrnoRegistry) -> Result<&'static Errno> {
        let code = make_code(self.service, self.category, self.sequence)?;
        let category = Category::from_number(self.category);

        let http = match (self.http, category) {
            (Some(status), _) => status,
            (None, Some(category)) => category.default_http(),
            (None, None) => 500,
        };
        let rpc = match (self.rpc, category) {
            (Some(code), _) => code,
            (None, Some(category)) => category.default_rpc(),
            (None, None) => RpcCode::Unknown,
        };
        if self.message_en.is_empty() {
            return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "error code {} requires an English message",
                code
            )));
        }

        registry.register(Errno::new(code, http, rpc, self.message_en, self.message_zh)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errno::{ERR_INTERNAL, ERR_NO_PERMISSION, OK};

    #[test]
    fn test_builtins_are_preregistered() {
        let registry = ErrnoRegistry::new();
        assert!(std::ptr::eq(registry.lookup(0).unwrap(), &OK));
        assert!(std::ptr::eq(
            registry.lookup(ERR_NO_PERMISSION.code()).unwrap(),
            &ERR_NO_PERMISSION
        ));
        assert_eq!(registry.service_name(0).as_deref(), Some("common"));
    }

    #[test]
    fn test_lookup_returns_registered_handle() {
        let registry = ErrnoRegistry::new();
        let handle = registry
            .new_error(Category::Resource, 11, 1, "Order not found", Some("订单不存在"))
            .unwrap();

        let found = registry.lookup(1_104_001).unwrap();
        assert!(std::ptr::eq(handle, found));
        assert_eq!(found.http_status(), 404);
        assert_eq!(found.rpc_status(), RpcCode::NotFound);
    }

    #[test]
    fn test_double_register_same_attributes_is_noop() {
        let registry = ErrnoRegistry::new();
        let first = registry
            .new_error(Category::Auth, 12, 9, "Key rotated", None)
            .unwrap();
        let second = registry
            .new_error(Category::Auth, 12, 9, "Key rotated", None)
            .unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_double_register_different_attributes_fails() {
        let registry = ErrnoRegistry::new();
        registry
            .new_error(Category::Auth, 13, 9, "Key rotated", None)
            .unwrap();
        let err = registry
            .new_error(Category::Auth, 13, 9, "Key retired", None)
            .unwrap_err();
        assert!(err.is(&ERR_ALREADY_EXISTS));
    }

    #[test]
    fn test_builtin_collision_detected() {
        let registry = ErrnoRegistry::new();
        let err = registry
            .register(Errno::new(ERR_INTERNAL.code(), 500, RpcCode::Internal, "Boom", None).unwrap())
            .unwrap_err();
        assert!(err.is(&ERR_ALREADY_EXISTS));
    }

    #[test]
    fn test_success_category_reserved() {
        let registry = ErrnoRegistry::new();
        let err = ErrnoBuilder::new(14, 0, 1)
            .message("Fine", None)
            .register_in(&registry)
            .unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
    }

    #[test]
    fn test_builder_validates_ranges() {
        let registry = ErrnoRegistry::new();
        let err = ErrnoBuilder::new(100, 1, 1)
            .message("Bad", None)
            .register_in(&registry)
            .unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
    }

    #[test]
    fn test_builder_requires_message() {
        let registry = ErrnoRegistry::new();
        assert!(ErrnoBuilder::new(15, 1, 1).register_in(&registry).is_err());
    }

    #[test]
    fn test_builder_overrides_status() {
        let registry = ErrnoRegistry::new();
        let errno = ErrnoBuilder::new(16, 10, 5)
            .http(502)
            .rpc(RpcCode::Unavailable)
            .message("Upstream reset", Some("上游重置"))
            .register_in(&registry)
            .unwrap();
        assert_eq!(errno.http_status(), 502);
        assert_eq!(errno.message("zh"), "上游重置");
    }

    #[test]
    fn test_service_registration() {
        let registry = ErrnoRegistry::new();
        registry.register_service(20, "billing").unwrap();
        registry.register_service(20, "billing").unwrap();
        let err = registry.register_service(20, "orders").unwrap_err();
        assert!(err.is(&ERR_ALREADY_EXISTS));
        assert_eq!(registry.service_name(20).as_deref(), Some("billing"));
        assert!(registry.register_service(100, "x").is_err());
        assert!(registry.service_name(21).is_none());
    }

    #[test]
    fn test_global_factories_register_once() {
        let a = new_timeout_error(90, 1, "Upstream slow", Some("上游缓慢")).unwrap();
        let b = new_timeout_error(90, 1, "Upstream slow", Some("上游缓慢")).unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.http_status(), 504);
        assert!(std::ptr::eq(lookup(a.code()).unwrap(), a));
        assert!(new_timeout_error(90, 1, "Upstream stuck", None).is_err());
    }
}
