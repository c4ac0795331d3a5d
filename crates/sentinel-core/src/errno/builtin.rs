//! 공통 서비스(0)의 내장 에러 코드.
//!
//! 전역 레지스트리는 최초 사용 시 이 목록 전체를 등록합니다.

use super::{Category, Errno, RpcCode};

// =========================================================================
// 성공
// =========================================================================

pub static OK: Errno = Errno::builtin(
    Category::Success,
    0,
    200,
    RpcCode::Ok,
    "Success",
    "成功",
);

// =========================================================================
// 요청 에러 (카테고리 01)
// =========================================================================

pub static ERR_BAD_REQUEST: Errno = Errno::builtin(
    Category::Request,
    0,
    Category::Request.default_http(),
    Category::Request.default_rpc(),
    "Bad request",
    "请求错误",
);
pub static ERR_INVALID_PARAM: Errno = Errno::builtin(
    Category::Request,
    1,
    Category::Request.default_http(),
    Category::Request.default_rpc(),
    "Invalid parameter",
    "参数无效",
);
pub static ERR_MISSING_PARAM: Errno = Errno::builtin(
    Category::Request,
    2,
    Category::Request.default_http(),
    Category::Request.default_rpc(),
    "Missing required parameter",
    "缺少必需参数",
);
pub static ERR_INVALID_FORMAT: Errno = Errno::builtin(
    Category::Request,
    3,
    Category::Request.default_http(),
    Category::Request.default_rpc(),
    "Invalid format",
    "格式无效",
);
pub static ERR_VALIDATION_FAILED: Errno = Errno::builtin(
    Category::Request,
    4,
    Category::Request.default_http(),
    Category::Request.default_rpc(),
    "Validation failed",
    "验证失败",
);
pub static ERR_REQUEST_TOO_LARGE: Errno = Errno::builtin(
    Category::Request,
    5,
    413,
    Category::Request.default_rpc(),
    "Request entity too large",
    "请求体过大",
);
pub static ERR_UNSUPPORTED_MEDIA_TYPE: Errno = Errno::builtin(
    Category::Request,
    6,
    415,
    Category::Request.default_rpc(),
    "Unsupported media type",
    "不支持的媒体类型",
);

// =========================================================================
// 인증 에러 (카테고리 02)
// =========================================================================

pub static ERR_UNAUTHORIZED: Errno = Errno::builtin(
    Category::Auth,
    0,
    Category::Auth.default_http(),
    Category::Auth.default_rpc(),
    "Unauthorized",
    "未认证",
);
pub static ERR_INVALID_TOKEN: Errno = Errno::builtin(
    Category::Auth,
    1,
    Category::Auth.default_http(),
    Category::Auth.default_rpc(),
    "Invalid token",
    "令牌无效",
);
pub static ERR_TOKEN_EXPIRED: Errno = Errno::builtin(
    Category::Auth,
    2,
    Category::Auth.default_http(),
    Category::Auth.default_rpc(),
    "Token expired",
    "令牌已过期",
);
pub static ERR_INVALID_CREDENTIALS: Errno = Errno::builtin(
    Category::Auth,
    3,
    Category::Auth.default_http(),
    Category::Auth.default_rpc(),
    "Invalid credentials",
    "凭证无效",
);
pub static ERR_TOKEN_REVOKED: Errno = Errno::builtin(
    Category::Auth,
    4,
    Category::Auth.default_http(),
    Category::Auth.default_rpc(),
    "Token revoked",
    "令牌已撤销",
);
pub static ERR_SESSION_EXPIRED: Errno = Errno::builtin(
    Category::Auth,
    5,
    Category::Auth.default_http(),
    Category::Auth.default_rpc(),
    "Session expired",
    "会话已过期",
);

// =========================================================================
// 권한 에러 (카테고리 03)
// =========================================================================

pub static ERR_FORBIDDEN: Errno = Errno::builtin(
    Category::Permission,
    0,
    Category::Permission.default_http(),
    Category::Permission.default_rpc(),
    "Forbidden",
    "禁止访问",
);
pub static ERR_NO_PERMISSION: Errno = Errno::builtin(
    Category::Permission,
    1,
    Category::Permission.default_http(),
    Category::Permission.default_rpc(),
    "No permission",
    "无权限",
);
pub static ERR_RESOURCE_LOCKED: Errno = Errno::builtin(
    Category::Permission,
    2,
    423,
    Category::Permission.default_rpc(),
    "Resource locked",
    "资源已锁定",
);
pub static ERR_ACCOUNT_DISABLED: Errno = Errno::builtin(
    Category::Permission,
    3,
    Category::Permission.default_http(),
    Category::Permission.default_rpc(),
    "Account disabled",
    "账号已禁用",
);
pub static ERR_IP_BLOCKED: Errno = Errno::builtin(
    Category::Permission,
    4,
    Category::Permission.default_http(),
    Category::Permission.default_rpc(),
    "IP blocked",
    "IP 已被封禁",
);

// =========================================================================
// 리소스 에러 (카테고리 04)
// =========================================================================

pub static ERR_NOT_FOUND: Errno = Errno::builtin(
    Category::Resource,
    0,
    Category::Resource.default_http(),
    Category::Resource.default_rpc(),
    "Resource not found",
    "资源不存在",
);
pub static ERR_USER_NOT_FOUND: Errno = Errno::builtin(
    Category::Resource,
    1,
    Category::Resource.default_http(),
    Category::Resource.default_rpc(),
    "User not found",
    "用户不存在",
);
pub static ERR_RECORD_NOT_FOUND: Errno = Errno::builtin(
    Category::Resource,
    2,
    Category::Resource.default_http(),
    Category::Resource.default_rpc(),
    "Record not found",
    "记录不存在",
);
pub static ERR_FILE_NOT_FOUND: Errno = Errno::builtin(
    Category::Resource,
    3,
    Category::Resource.default_http(),
    Category::Resource.default_rpc(),
    "File not found",
    "文件不存在",
);
pub static ERR_ROUTE_NOT_FOUND: Errno = Errno::builtin(
    Category::Resource,
    4,
    Category::Resource.default_http(),
    Category::Resource.default_rpc(),
    "Route not found",
    "路由不存在",
);

// =========================================================================
// 충돌 에러 (카테고리 05)
// =========================================================================

pub static ERR_CONFLICT: Errno = Errno::builtin(
    Category::Conflict,
    0,
    Category::Conflict.default_http(),
    Category::Conflict.default_rpc(),
    "Resource conflict",
    "资源冲突",
);
pub static ERR_ALREADY_EXISTS: Errno = Errno::builtin(
    Category::Conflict,
    1,
    Category::Conflict.default_http(),
    Category::Conflict.default_rpc(),
    "Resource already exists",
    "资源已存在",
);
pub static ERR_DUPLICATE_KEY: Errno = Errno::builtin(
    Category::Conflict,
    2,
    Category::Conflict.default_http(),
    Category::Conflict.default_rpc(),
    "Duplicate key",
    "键值重复",
);
pub static ERR_VERSION_CONFLICT: Errno = Errno::builtin(
    Category::Conflict,
    3,
    Category::Conflict.default_http(),
    Category::Conflict.default_rpc(),
    "Version conflict",
    "版本冲突",
);

// =========================================================================
// 요청 한도 에러 (카테고리 06)
// =========================================================================

pub static ERR_TOO_MANY_REQUESTS: Errno = Errno::builtin(
    Category::RateLimit,
    0,
    Category::RateLimit.default_http(),
    Category::RateLimit.default_rpc(),
    "Too many requests",
    "请求过于频繁",
);
pub static ERR_RATE_LIMIT_EXCEEDED: Errno = Errno::builtin(
    Category::RateLimit,
    1,
    Category::RateLimit.default_http(),
    Category::RateLimit.default_rpc(),
    "Rate limit exceeded",
    "超出速率限制",
);
pub static ERR_QUOTA_EXCEEDED: Errno = Errno::builtin(
    Category::RateLimit,
    2,
    Category::RateLimit.default_http(),
    Category::RateLimit.default_rpc(),
    "Quota exceeded",
    "配额已用尽",
);

// =========================================================================
// 내부 에러 (카테고리 07)
// =========================================================================

pub static ERR_INTERNAL: Errno = Errno::builtin(
    Category::Internal,
    0,
    Category::Internal.default_http(),
    Category::Internal.default_rpc(),
    "Internal server error",
    "服务器内部错误",
);
pub static ERR_UNKNOWN: Errno = Errno::builtin(
    Category::Internal,
    1,
    Category::Internal.default_http(),
    RpcCode::Unknown,
    "Unknown error",
    "未知错误",
);
pub static ERR_PANIC: Errno = Errno::builtin(
    Category::Internal,
    2,
    Category::Internal.default_http(),
    Category::Internal.default_rpc(),
    "Service panic",
    "服务崩溃",
);
pub static ERR_NOT_IMPLEMENTED: Errno = Errno::builtin(
    Category::Internal,
    3,
    501,
    RpcCode::Unimplemented,
    "Not implemented",
    "功能未实现",
);

// =========================================================================
// 데이터베이스 에러 (카테고리 08)
// =========================================================================

pub static ERR_DATABASE: Errno = Errno::builtin(
    Category::Database,
    0,
    Category::Database.default_http(),
    Category::Database.default_rpc(),
    "Database error",
    "数据库错误",
);
pub static ERR_DB_CONNECTION: Errno = Errno::builtin(
    Category::Database,
    1,
    Category::Database.default_http(),
    RpcCode::Unavailable,
    "Database connection failed",
    "数据库连接失败",
);
pub static ERR_DB_QUERY: Errno = Errno::builtin(
    Category::Database,
    2,
    Category::Database.default_http(),
    Category::Database.default_rpc(),
    "Database query failed",
    "数据库查询失败",
);
pub static ERR_DB_TRANSACTION: Errno = Errno::builtin(
    Category::Database,
    3,
    Category::Database.default_http(),
    Category::Database.default_rpc(),
    "Database transaction failed",
    "数据库事务失败",
);
pub static ERR_DB_DEADLOCK: Errno = Errno::builtin(
    Category::Database,
    4,
    Category::Database.default_http(),
    Category::Database.default_rpc(),
    "Database deadlock",
    "数据库死锁",
);

// =========================================================================
// 캐시 에러 (카테고리 09)
// =========================================================================

pub static ERR_CACHE: Errno = Errno::builtin(
    Category::Cache,
    0,
    Category::Cache.default_http(),
    Category::Cache.default_rpc(),
    "Cache error",
    "缓存错误",
);
pub static ERR_CACHE_CONNECTION: Errno = Errno::builtin(
    Category::Cache,
    1,
    Category::Cache.default_http(),
    Category::Cache.default_rpc(),
    "Cache connection failed",
    "缓存连接失败",
);
pub static ERR_CACHE_MISS: Errno = Errno::builtin(
    Category::Cache,
    2,
    Category::Cache.default_http(),
    Category::Cache.default_rpc(),
    "Cache miss",
    "缓存未命中",
);
pub static ERR_CACHE_EXPIRED: Errno = Errno::builtin(
    Category::Cache,
    3,
    Category::Cache.default_http(),
    Category::Cache.default_rpc(),
    "Cache expired",
    "缓存已过期",
);

// =========================================================================
// 네트워크 에러 (카테고리 10)
// =========================================================================

pub static ERR_NETWORK: Errno = Errno::builtin(
    Category::Network,
    0,
    Category::Network.default_http(),
    Category::Network.default_rpc(),
    "Network error",
    "网络错误",
);
pub static ERR_SERVICE_UNAVAILABLE: Errno = Errno::builtin(
    Category::Network,
    1,
    Category::Network.default_http(),
    Category::Network.default_rpc(),
    "Service unavailable",
    "服务不可用",
);
pub static ERR_CONNECTION_REFUSED: Errno = Errno::builtin(
    Category::Network,
    2,
    Category::Network.default_http(),
    Category::Network.default_rpc(),
    "Connection refused",
    "连接被拒绝",
);
pub static ERR_DNS_RESOLUTION: Errno = Errno::builtin(
    Category::Network,
    3,
    Category::Network.default_http(),
    Category::Network.default_rpc(),
    "DNS resolution failed",
    "DNS 解析失败",
);

// =========================================================================
// 타임아웃 에러 (카테고리 11)
// =========================================================================

pub static ERR_TIMEOUT: Errno = Errno::builtin(
    Category::Timeout,
    0,
    Category::Timeout.default_http(),
    Category::Timeout.default_rpc(),
    "Operation timeout",
    "操作超时",
);
pub static ERR_REQUEST_TIMEOUT: Errno = Errno::builtin(
    Category::Timeout,
    1,
    408,
    Category::Timeout.default_rpc(),
    "Request timeout",
    "请求超时",
);
pub static ERR_GATEWAY_TIMEOUT: Errno = Errno::builtin(
    Category::Timeout,
    2,
    Category::Timeout.default_http(),
    Category::Timeout.default_rpc(),
    "Gateway timeout",
    "网关超时",
);
pub static ERR_CONTEXT_CANCELED: Errno = Errno::builtin(
    Category::Timeout,
    3,
    499,
    RpcCode::Cancelled,
    "Context canceled",
    "上下文已取消",
);

// =========================================================================
// 설정 에러 (카테고리 12)
// =========================================================================

pub static ERR_CONFIG: Errno = Errno::builtin(
    Category::Config,
    0,
    Category::Config.default_http(),
    Category::Config.default_rpc(),
    "Configuration error",
    "配置错误",
);
pub static ERR_CONFIG_NOT_FOUND: Errno = Errno::builtin(
    Category::Config,
    1,
    Category::Config.default_http(),
    Category::Config.default_rpc(),
    "Configuration not found",
    "配置不存在",
);
pub static ERR_CONFIG_INVALID: Errno = Errno::builtin(
    Category::Config,
    2,
    Category::Config.default_http(),
    Category::Config.default_rpc(),
    "Invalid configuration",
    "配置无效",
);

/// 내장 에러 코드 전체 목록.
pub static BUILTINS: &[&Errno] = &[
    &OK,
    &ERR_BAD_REQUEST,
    &ERR_INVALID_PARAM,
    &ERR_MISSING_PARAM,
    &ERR_INVALID_FORMAT,
    &ERR_VALIDATION_FAILED,
    &ERR_REQUEST_TOO_LARGE,
    &ERR_UNSUPPORTED_MEDIA_TYPE,
    &ERR_UNAUTHORIZED,
    &ERR_INVALID_TOKEN,
    &ERR_TOKEN_EXPIRED,
    &ERR_INVALID_CREDENTIALS,
    &ERR_TOKEN_REVOKED,
    &ERR_SESSION_EXPIRED,
    &ERR_FORBIDDEN,
    &ERR_NO_PERMISSION,
    &ERR_RESOURCE_LOCKED,
    &ERR_ACCOUNT_DISABLED,
    &ERR_IP_BLOCKED,
    &ERR_NOT_FOUND,
    &ERR_USER_NOT_FOUND,
    &ERR_RECORD_NOT_FOUND,
    &ERR_FILE_NOT_FOUND,
    &ERR_ROUTE_NOT_FOUND,
    &ERR_CONFLICT,
    &ERR_ALREADY_EXISTS,
    &ERR_DUPLICATE_KEY,
    &ERR_VERSION_CONFLICT,
    &ERR_TOO_MANY_REQUESTS,
    &ERR_RATE_LIMIT_EXCEEDED,
    &ERR_QUOTA_EXCEEDED,
    &ERR_INTERNAL,
    &ERR_UNKNOWN,
    &ERR_PANIC,
    &ERR_NOT_IMPLEMENTED,
    &ERR_DATABASE,
    &ERR_DB_CONNECTION,
    &ERR_DB_QUERY,
    &ERR_DB_TRANSACTION,
    &ERR_DB_DEADLOCK,
    &ERR_CACHE,
    &ERR_CACHE_CONNECTION,
    &ERR_CACHE_MISS,
    &ERR_CACHE_EXPIRED,
    &ERR_NETWORK,
    &ERR_SERVICE_UNAVAILABLE,
    &ERR_CONNECTION_REFUSED,
    &ERR_DNS_RESOLUTION,
    &ERR_TIMEOUT,
    &ERR_REQUEST_TIMEOUT,
    &ERR_GATEWAY_TIMEOUT,
    &ERR_CONTEXT_CANCELED,
    &ERR_CONFIG,
    &ERR_CONFIG_NOT_FOUND,
    &ERR_CONFIG_INVALID,
];
