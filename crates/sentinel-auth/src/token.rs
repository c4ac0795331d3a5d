//! 발급 토큰과 서명 옵션.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 토큰 스킴.
pub const BEARER: &str = "Bearer";

/// 발급된 토큰.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// 서명된 토큰 문자열
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 만료 시각 (Unix timestamp)
    pub expires_at: i64,
    /// 남은 유효 시간 (초)
    pub expires_in: i64,
    /// 갱신 토큰
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Token {
    pub(crate) fn bearer(access_token: String, issued_at: i64, expires_at: i64) -> Self {
        Self {
            access_token,
            token_type: BEARER.to_string(),
            expires_at,
            expires_in: expires_at - issued_at,
            refresh_token: None,
        }
    }
}

/// 서명 옵션.
///
/// ```
/// use sentinel_auth::SignOptions;
/// use serde_json::json;
///
/// let options = SignOptions::new()
///     .extra("role", json!("admin"))
///     .audience(["web"])
///     .token_id("fixed-id");
/// assert_eq!(options.token_id_ref(), Some("fixed-id"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    pub(crate) expires_at: Option<i64>,
    pub(crate) extras: Map<String, Value>,
    pub(crate) audience: Option<Vec<String>>,
    pub(crate) token_id: Option<String>,
}

impl SignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이번 발급의 만료 시각을 지정합니다 (기본 TTL 대체).
    pub fn expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// 추가 클레임 하나를 병합합니다.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// 추가 클레임 맵을 병합합니다.
    pub fn extras(mut self, extras: Map<String, Value>) -> Self {
        self.extras.extend(extras);
        self
    }

    /// 대상 집합을 지정합니다.
    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = Some(audience.into_iter().map(Into::into).collect());
        self
    }

    /// 호출자가 정한 토큰 ID를 사용합니다.
    pub fn token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    /// 지정된 토큰 ID.
    pub fn token_id_ref(&self) -> Option<&str> {
        self.token_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_json_shape() {
        let token = Token::bearer("abc.def.ghi".to_string(), 100, 160);
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(
            value,
            json!({
                "access_token": "abc.def.ghi",
                "token_type": "Bearer",
                "expires_at": 160,
                "expires_in": 60
            })
        );
    }

    #[test]
    fn test_sign_options_merge_extras() {
        let mut extra = Map::new();
        extra.insert("tenant".to_string(), json!("acme"));
        let options = SignOptions::new()
            .extra("role", json!("admin"))
            .extras(extra)
            .expires_at(500);
        assert_eq!(options.extras.len(), 2);
        assert_eq!(options.expires_at, Some(500));
        assert!(options.audience.is_none());
    }
}
