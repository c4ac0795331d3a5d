//! 설정 관리.
//!
//! 기본값 → 설정 파일(선택) → 환경 변수 순으로 덮어씁니다.
//! 환경 변수는 `SENTINEL` 접두사와 `__` 구분자를 사용합니다
//! (예: `SENTINEL__AUTH__SIGNING_KEY`, `SENTINEL__POLICY__BACKEND=redis`).

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::errno::{ERR_CONFIG_INVALID, ERR_CONFIG_NOT_FOUND};
use crate::error::{Error, Result};

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 토큰 엔진 설정
    pub auth: AuthConfig,
    /// 차단 목록 저장소 설정
    #[serde(default)]
    pub blocklist: BlocklistConfig,
    /// 정책 저장소/와처 설정
    #[serde(default)]
    pub policy: PolicyConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 토큰 엔진 설정.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC 서명 키 (32바이트 이상, 로그에 출력되지 않음)
    #[serde(deserialize_with = "deserialize_secret")]
    pub signing_key: SecretString,
    /// 발급자
    #[serde(default)]
    pub issuer: Option<String>,
    /// 대상
    #[serde(default)]
    pub audience: Vec<String>,
    /// 기본 유효 기간 (초)
    #[serde(default = "default_ttl")]
    pub ttl_secs: i64,
    /// 만료 후 갱신 허용 시간 (초)
    #[serde(default)]
    pub refresh_grace_secs: i64,
    /// 최대 갱신 세대 수
    #[serde(default)]
    pub max_refresh: Option<u32>,
    /// 차단 목록 항목의 추가 보존 시간 (초)
    #[serde(default = "default_safety_margin")]
    pub safety_margin_secs: i64,
}

fn default_ttl() -> i64 {
    7200 // 2 hours
}
fn default_safety_margin() -> i64 {
    60
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// 저장소 백엔드 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// 프로세스 내 메모리
    #[default]
    Memory,
    /// Redis
    Redis,
}

/// 차단 목록 저장소 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct BlocklistConfig {
    /// 저장소 백엔드
    #[serde(default)]
    pub backend: Backend,
    /// Redis URL (redis 백엔드에서 사용)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// 키 접두사
    #[serde(default = "default_blocklist_prefix")]
    pub key_prefix: String,
    /// 메모리 백엔드의 정리 주기 (초)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}
fn default_blocklist_prefix() -> String {
    "sentinel:blocklist:".to_string()
}
fn default_sweep_interval() -> u64 {
    60
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            redis_url: default_redis_url(),
            key_prefix: default_blocklist_prefix(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// 정책 저장소/와처 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// 저장소 백엔드
    #[serde(default)]
    pub backend: Backend,
    /// Redis URL (redis 백엔드에서 사용)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// 규칙 목록 키
    #[serde(default = "default_policy_key")]
    pub key: String,
    /// 변경 알림 채널
    #[serde(default = "default_watcher_channel")]
    pub watcher_channel: String,
    /// 모든 권한을 가지는 역할
    #[serde(default)]
    pub super_admin: Option<String>,
    /// 저장소가 비어 있을 때 불러올 규칙 파일 (한 줄에 규칙 하나)
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_policy_key() -> String {
    "sentinel:policy".to_string()
}
fn default_watcher_channel() -> String {
    "sentinel:policy:watch".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            redis_url: default_redis_url(),
            key: default_policy_key(),
            watcher_channel: default_watcher_channel(),
            super_admin: None,
            seed_file: None,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")
            .and_then(|b| b.set_default("server.port", 3000))
            .map_err(config_error)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.audience")
                    .try_parsing(true),
            );

        let config = builder.build().map_err(config_error)?;
        config.try_deserialize().map_err(config_error)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self> {
        Self::load("config/default.toml")
    }
}

fn config_error(err: config::ConfigError) -> Error {
    match err {
        config::ConfigError::NotFound(ref key) => {
            ERR_CONFIG_NOT_FOUND.with_message(format!("missing configuration: {}", key))
        }
        other => ERR_CONFIG_INVALID
            .with_message(other.to_string())
            .with_cause(other),
    }
}
