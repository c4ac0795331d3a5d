//! Claims 및 Principal.
//!
//! Claims는 검증된 토큰의 내용이고, Principal은 검증 시점에 Claims에서
//! 만들어져 요청 컨텍스트를 통해서만 노출되는 인증 주체입니다.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 표준 클레임 이름. 추가 클레임(extras)으로 사용할 수 없습니다.
pub const RESERVED_CLAIMS: [&str; 7] = ["sub", "iss", "aud", "iat", "nbf", "exp", "jti"];

/// 테넌트 추가 클레임 키.
pub const TENANT_CLAIM: &str = "tenant";

/// 토큰 페이로드.
///
/// 표준 클레임은 JWT 등록 클레임 이름으로 직렬화되며, 추가 클레임은
/// 최상위 객체에 평탄화됩니다.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 주체 ID
    pub sub: String,
    /// Issuer - 발급자
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,
    /// Audience - 대상 집합
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub aud: Vec<String>,
    /// Issued At - 발급 시각 (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Not Before - 유효 시작 시각
    #[serde(default)]
    pub nbf: i64,
    /// Expiration - 만료 시각
    #[serde(default)]
    pub exp: i64,
    /// JWT ID - 발급 고유 식별자
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    /// 추가 클레임
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Claims {
    /// 시간 기준 유효성.
    ///
    /// `exp`/`nbf`가 0이면 해당 검사를 건너뜁니다. 차단 목록 검사는
    /// 토큰 엔진이 수행합니다.
    pub fn valid(&self, now: i64) -> bool {
        (self.exp == 0 || now <= self.exp) && (self.nbf == 0 || now >= self.nbf)
    }

    /// 추가 클레임 값을 문자열로 조회합니다.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key).and_then(Value::as_str)
    }

    /// 선택적 테넌트 클레임.
    pub fn tenant(&self) -> Option<&str> {
        self.extra_str(TENANT_CLAIM)
    }

    /// 대상 집합에 포함되는지 확인합니다.
    pub fn has_audience(&self, audience: &str) -> bool {
        self.aud.iter().any(|a| a == audience)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(aud) => vec![aud],
        OneOrMany::Many(aud) => aud,
    })
}

/// 인증된 주체.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    subject: String,
    extras: Map<String, Value>,
}

impl Principal {
    /// 주체 ID.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// 추가 클레임.
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// 선택적 테넌트.
    pub fn tenant(&self) -> Option<&str> {
        self.extras.get(TENANT_CLAIM).and_then(Value::as_str)
    }

    /// 추가 클레임이 주어진 값을 가지는지 확인합니다.
    ///
    /// 배열 클레임이면 원소 포함 여부를 확인합니다 (예: `roles`).
    pub fn has_extra(&self, key: &str, value: &str) -> bool {
        match self.extras.get(key) {
            Some(Value::String(s)) => s == value,
            Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(value)),
            _ => false,
        }
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            extras: claims.extras.clone(),
        }
    }
}
