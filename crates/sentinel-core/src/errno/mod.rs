//! 구조화된 에러 코드.
//!
//! 모든 에러 코드는 `서비스·카테고리·순번` 형태의 정수로 패킹됩니다:
//! `service * 100000 + category * 1000 + sequence`.
//!
//! - **service**: `[0, 99]`, 0은 공통 서비스
//! - **category**: `[0, 99]`, 기본 HTTP/RPC 상태를 결정
//! - **sequence**: `[0, 999]`
//!
//! 패킹된 값 0은 성공 코드로 예약되어 있습니다.

pub mod builtin;
pub mod legacy;
pub mod registry;

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

pub use builtin::*;
pub use legacy::{from_legacy, to_legacy};
pub use registry::{
    lookup, new_auth_error, new_cache_error, new_config_error, new_conflict_error,
    new_database_error, new_internal_error, new_network_error, new_permission_error,
    new_rate_limit_error, new_request_error, new_resource_error, new_timeout_error, register,
    register_service, registry, service_name, ErrnoBuilder, ErrnoRegistry,
};

/// 서비스 번호 최댓값.
pub const MAX_SERVICE: i32 = 99;
/// 카테고리 번호 최댓값.
pub const MAX_CATEGORY: i32 = 99;
/// 순번 최댓값.
pub const MAX_SEQUENCE: i32 = 999;

const SERVICE_FACTOR: i32 = 100_000;
const CATEGORY_FACTOR: i32 = 1_000;

/// 에러 카테고리.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Success = 0,
    Request = 1,
    Auth = 2,
    Permission = 3,
    Resource = 4,
    Conflict = 5,
    RateLimit = 6,
    Internal = 7,
    Database = 8,
    Cache = 9,
    Network = 10,
    Timeout = 11,
    Config = 12,
}

impl Category {
    /// 카테고리 번호로부터 변환합니다. 알 수 없는 번호는 `None`.
    pub fn from_number(n: i32) -> Option<Self> {
        let category = match n {
            0 => Self::Success,
            1 => Self::Request,
            2 => Self::Auth,
            3 => Self::Permission,
            4 => Self::Resource,
            5 => Self::Conflict,
            6 => Self::RateLimit,
            7 => Self::Internal,
            8 => Self::Database,
            9 => Self::Cache,
            10 => Self::Network,
            11 => Self::Timeout,
            12 => Self::Config,
            _ => return None,
        };
        Some(category)
    }

    /// 카테고리 번호.
    pub const fn number(self) -> i32 {
        self as i32
    }

    /// 카테고리의 기본 HTTP 상태.
    pub const fn default_http(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::Request => 400,
            Self::Auth => 401,
            Self::Permission => 403,
            Self::Resource => 404,
            Self::Conflict => 409,
            Self::RateLimit => 429,
            Self::Internal | Self::Database | Self::Cache | Self::Config => 500,
            Self::Network => 503,
            Self::Timeout => 504,
        }
    }

    /// 카테고리의 기본 RPC 상태.
    pub const fn default_rpc(self) -> RpcCode {
        match self {
            Self::Success => RpcCode::Ok,
            Self::Request => RpcCode::InvalidArgument,
            Self::Auth => RpcCode::Unauthenticated,
            Self::Permission => RpcCode::PermissionDenied,
            Self::Resource => RpcCode::NotFound,
            Self::Conflict => RpcCode::AlreadyExists,
            Self::RateLimit => RpcCode::ResourceExhausted,
            Self::Internal | Self::Database | Self::Cache | Self::Config => RpcCode::Internal,
            Self::Network => RpcCode::Unavailable,
            Self::Timeout => RpcCode::DeadlineExceeded,
        }
    }

    /// 클라이언트 측 에러 카테고리인지 확인합니다.
    pub fn is_client(self) -> bool {
        (Self::Request..=Self::RateLimit).contains(&self)
    }

    /// 서버 측 에러 카테고리인지 확인합니다.
    pub fn is_server(self) -> bool {
        (Self::Internal..=Self::Config).contains(&self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Request => "request",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Resource => "resource",
            Self::Conflict => "conflict",
            Self::RateLimit => "rate_limit",
            Self::Internal => "internal",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// RPC 상태 코드 (gRPC 상태 번호와 동일).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl RpcCode {
    /// 숫자 상태 값.
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// 등록된 에러 코드.
///
/// 레지스트리에 등록된 값은 `&'static Errno` 핸들로 공유되며,
/// 인스턴스 생성(`with_message`, `with_cause`)은 재등록을 일으키지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errno {
    code: i32,
    http: u16,
    rpc: RpcCode,
    message_en: Cow<'static, str>,
    message_zh: Option<Cow<'static, str>>,
}

impl Errno {
    /// 내장 에러 코드를 위한 const 생성자.
    pub(crate) const fn builtin(
        category: Category,
        sequence: i32,
        http: u16,
        rpc: RpcCode,
        en: &'static str,
        zh: &'static str,
    ) -> Self {
        Self {
            code: category.number() * CATEGORY_FACTOR + sequence,
            http,
            rpc,
            message_en: Cow::Borrowed(en),
            message_zh: Some(Cow::Borrowed(zh)),
        }
    }

    /// 등록 전의 에러 코드 값을 생성합니다.
    ///
    /// 코드 범위만 검사하며, 유일성은 [`register`]에서 검사합니다.
    pub fn new(
        code: i32,
        http: u16,
        rpc: RpcCode,
        message_en: impl Into<Cow<'static, str>>,
        message_zh: Option<Cow<'static, str>>,
    ) -> Result<Self> {
        parse_code(code)?;
        Ok(Self {
            code,
            http,
            rpc,
            message_en: message_en.into(),
            message_zh,
        })
    }

    /// 패킹된 코드.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// HTTP 상태.
    pub fn http_status(&self) -> u16 {
        self.http
    }

    /// RPC 상태.
    pub fn rpc_status(&self) -> RpcCode {
        self.rpc
    }

    /// 코드의 카테고리. 정의되지 않은 카테고리 번호면 `None`.
    pub fn category(&self) -> Option<Category> {
        Category::from_number((self.code % SERVICE_FACTOR) / CATEGORY_FACTOR)
    }

    /// 영어 메시지.
    pub fn message_en(&self) -> &str {
        &self.message_en
    }

    /// 현지화 메시지.
    pub fn message_zh(&self) -> Option<&str> {
        self.message_zh.as_deref()
    }

    /// 로케일에 맞는 메시지를 반환합니다.
    ///
    /// `zh`로 시작하는 로케일은 현지화 메시지를, 그 외에는 영어 메시지를 선택합니다.
    pub fn message(&self, locale: &str) -> &str {
        match &self.message_zh {
            Some(zh) if locale.to_ascii_lowercase().starts_with("zh") => zh,
            _ => &self.message_en,
        }
    }

    // =========================================================================
    // 인스턴스 생성
    // =========================================================================

    /// 기본 메시지를 가진 에러 인스턴스.
    pub fn error(&'static self) -> Error {
        Error::new(self)
    }

    /// 메시지를 덮어쓴 에러 인스턴스.
    pub fn with_message(&'static self, message: impl Into<String>) -> Error {
        Error::new(self).with_message(message)
    }

    /// 포맷 인자로 메시지를 덮어쓴 에러 인스턴스.
    ///
    /// ```
    /// use sentinel_core::errno::ERR_NO_PERMISSION;
    ///
    /// let err = ERR_NO_PERMISSION.with_formatted_message(format_args!("{} cannot {}", "bob", "delete"));
    /// assert_eq!(err.to_string(), "errno 3001: bob cannot delete");
    /// ```
    pub fn with_formatted_message(&'static self, args: fmt::Arguments<'_>) -> Error {
        Error::new(self).with_message(args.to_string())
    }

    /// 원인을 감싼 에러 인스턴스.
    pub fn with_cause<E>(&'static self, cause: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::new(self).with_cause(cause)
    }

    /// 원래 속성이 같은지 비교합니다 (등록 충돌 판단용).
    pub(crate) fn same_attributes(&self, other: &Errno) -> bool {
        self == other
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}: {}", self.code, self.message_en)
    }
}

/// 세 필드를 하나의 코드로 패킹합니다.
///
/// 각 필드가 범위를 벗어나면 `Request:InvalidParam`을 반환합니다.
pub fn make_code(service: i32, category: i32, sequence: i32) -> Result<i32> {
    if !(0..=MAX_SERVICE).contains(&service) {
        return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
            "service {} out of range [0, {}]",
            service, MAX_SERVICE
        )));
    }
    if !(0..=MAX_CATEGORY).contains(&category) {
        return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
            "category {} out of range [0, {}]",
            category, MAX_CATEGORY
        )));
    }
    if !(0..=MAX_SEQUENCE).contains(&sequence) {
        return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
            "sequence {} out of range [0, {}]",
            sequence, MAX_SEQUENCE
        )));
    }
    Ok(service * SERVICE_FACTOR + category * CATEGORY_FACTOR + sequence)
}

/// 패킹된 코드를 `(service, category, sequence)`로 분해합니다.
pub fn parse_code(code: i32) -> Result<(i32, i32, i32)> {
    if !(0..=MAX_SERVICE * SERVICE_FACTOR + MAX_CATEGORY * CATEGORY_FACTOR + MAX_SEQUENCE)
        .contains(&code)
    {
        return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
            "error code {} out of range",
            code
        )));
    }
    Ok((
        code / SERVICE_FACTOR,
        (code % SERVICE_FACTOR) / CATEGORY_FACTOR,
        code % CATEGORY_FACTOR,
    ))
}

/// 로그 출력용 7자리 표기 (`AABBCCC`).
pub fn format_code(code: i32) -> String {
    format!("{:07}", code)
}

/// 코드의 카테고리.
pub fn category_of(code: i32) -> Option<Category> {
    parse_code(code)
        .ok()
        .and_then(|(_, category, _)| Category::from_number(category))
}

/// 클라이언트 에러(Request..RateLimit) 여부.
pub fn is_client_error(code: i32) -> bool {
    category_of(code).is_some_and(Category::is_client)
}

/// 서버 에러(Internal..Config) 여부.
pub fn is_server_error(code: i32) -> bool {
    category_of(code).is_some_and(Category::is_server)
}

/// 성공 코드 여부.
pub fn is_success(code: i32) -> bool {
    code == 0
}
