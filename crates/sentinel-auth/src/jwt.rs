//! JWT 토큰 엔진.
//!
//! HS256 서명 토큰을 발급/검증/갱신/폐기합니다. 시간 검사는 주입된 시계로
//! 직접 수행하므로 jsonwebtoken의 exp/nbf 검증은 끕니다.
//!
//! 검증 실패는 가장 좁은 에러로 보고합니다:
//! 1. 빈 토큰, 형식/서명/알고리즘 오류, nbf 이전, 발급자/대상 불일치 → `InvalidToken`
//! 2. 차단 목록에 있는 토큰 ID → `TokenRevoked`
//! 3. exp 이후 → `TokenExpired`

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use sentinel_core::errno::{
    ERR_INTERNAL, ERR_INVALID_PARAM, ERR_INVALID_TOKEN, ERR_NOT_IMPLEMENTED, ERR_SESSION_EXPIRED,
    ERR_TOKEN_EXPIRED, ERR_TOKEN_REVOKED,
};
use sentinel_core::{system_clock, AuthConfig, Error, OpContext, Result, SharedClock};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::authenticator::Authenticator;
use crate::blocklist::BlocklistStore;
use crate::claims::{Claims, RESERVED_CLAIMS};
use crate::ledger::RefreshLedger;
use crate::token::{SignOptions, Token};

/// HMAC 키 최소 길이 (바이트).
pub const MIN_KEY_LEN: usize = 32;

/// 기본 유효 기간 (초).
pub const DEFAULT_TTL_SECS: i64 = 7200;

/// 기본 차단 목록 보존 여유 (초).
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

/// JWT 엔진 설정.
#[derive(Debug)]
pub struct JwtConfig {
    /// HMAC 서명 키
    pub signing_key: SecretString,
    /// 발급자 (설정 시 검증에서도 확인)
    pub issuer: Option<String>,
    /// 기본 대상 (설정 시 검증에서 교집합 확인)
    pub audience: Vec<String>,
    /// 기본 유효 기간 (초)
    pub ttl_secs: i64,
    /// 만료 후 갱신 허용 시간 (초)
    pub refresh_grace_secs: i64,
    /// 최대 갱신 세대 (갱신 원장이 있을 때만 적용)
    pub max_refresh: Option<u32>,
    /// 폐기 항목의 추가 보존 시간 (초)
    pub safety_margin_secs: i64,
}

impl JwtConfig {
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: SecretString::from(signing_key.into()),
            issuer: None,
            audience: Vec::new(),
            ttl_secs: DEFAULT_TTL_SECS,
            refresh_grace_secs: 0,
            max_refresh: None,
            safety_margin_secs: DEFAULT_SAFETY_MARGIN_SECS,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_refresh_grace_secs(mut self, grace_secs: i64) -> Self {
        self.refresh_grace_secs = grace_secs;
        self
    }

    pub fn with_max_refresh(mut self, max_refresh: u32) -> Self {
        self.max_refresh = Some(max_refresh);
        self
    }

    pub fn with_safety_margin_secs(mut self, margin_secs: i64) -> Self {
        self.safety_margin_secs = margin_secs;
        self
    }
}

impl From<AuthConfig> for JwtConfig {
    fn from(config: AuthConfig) -> Self {
        Self {
            signing_key: config.signing_key,
            issuer: config.issuer,
            audience: config.audience,
            ttl_secs: config.ttl_secs,
            refresh_grace_secs: config.refresh_grace_secs,
            max_refresh: config.max_refresh,
            safety_margin_secs: config.safety_margin_secs,
        }
    }
}

/// JWT 인증기.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    audience: Vec<String>,
    ttl_secs: i64,
    refresh_grace_secs: i64,
    max_refresh: Option<u32>,
    safety_margin_secs: i64,
    clock: SharedClock,
    blocklist: Option<Arc<dyn BlocklistStore>>,
    ledger: Option<Arc<dyn RefreshLedger>>,
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .field("has_blocklist", &self.blocklist.is_some())
            .field("has_ledger", &self.ledger.is_some())
            .finish_non_exhaustive()
    }
}

impl JwtAuthenticator {
    /// 설정으로 인증기를 생성합니다.
    ///
    /// 키가 32바이트보다 짧거나 기간 설정이 음수이면 `InvalidParam`을 반환합니다.
    pub fn new(config: JwtConfig) -> Result<Self> {
        let secret = config.signing_key.expose_secret().as_bytes();
        if secret.len() < MIN_KEY_LEN {
            return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "signing key must be at least {} bytes",
                MIN_KEY_LEN
            )));
        }
        if config.ttl_secs <= 0 {
            return Err(ERR_INVALID_PARAM.with_message("token ttl must be positive"));
        }
        if config.refresh_grace_secs < 0 || config.safety_margin_secs < 0 {
            return Err(ERR_INVALID_PARAM.with_message("refresh grace and safety margin must not be negative"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer,
            audience: config.audience,
            ttl_secs: config.ttl_secs,
            refresh_grace_secs: config.refresh_grace_secs,
            max_refresh: config.max_refresh,
            safety_margin_secs: config.safety_margin_secs,
            clock: system_clock(),
            blocklist: None,
            ledger: None,
        })
    }

    /// 시계를 교체합니다.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// 차단 목록 저장소를 연결합니다.
    pub fn with_blocklist(mut self, blocklist: Arc<dyn BlocklistStore>) -> Self {
        self.blocklist = Some(blocklist);
        self
    }

    /// 갱신 세대 원장을 연결합니다.
    pub fn with_ledger(mut self, ledger: Arc<dyn RefreshLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    // =========================================================================
    // 내부 헬퍼
    // =========================================================================

    fn issue(&self, claims: &Claims) -> Result<Token> {
        let access_token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ERR_INTERNAL.with_message("failed to sign token").with_cause(e))?;
        Ok(Token::bearer(access_token, claims.iat, claims.exp))
    }

    /// 서명만 검증하고 Claims를 꺼냅니다.
    fn parse(&self, token: &str) -> Result<Claims> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ERR_INVALID_TOKEN.with_message("token is empty"));
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?;
        Ok(data.claims)
    }

    /// nbf, 발급자, 대상을 검사합니다.
    fn check_trust(&self, claims: &Claims, now: i64) -> Result<()> {
        if claims.nbf != 0 && now < claims.nbf {
            return Err(ERR_INVALID_TOKEN.with_message("token not yet valid"));
        }
        if claims.sub.is_empty() {
            return Err(ERR_INVALID_TOKEN.with_message("token has no subject"));
        }
        if let Some(issuer) = &self.issuer {
            if &claims.iss != issuer {
                return Err(ERR_INVALID_TOKEN.with_message("token issuer mismatch"));
            }
        }
        if !self.audience.is_empty() && !self.audience.iter().any(|a| claims.has_audience(a)) {
            return Err(ERR_INVALID_TOKEN.with_message("token audience mismatch"));
        }
        Ok(())
    }

    async fn is_revoked(&self, ctx: &OpContext, claims: &Claims) -> Result<bool> {
        match &self.blocklist {
            Some(blocklist) if !claims.jti.is_empty() => {
                blocklist.is_revoked(ctx, &claims.jti).await
            }
            _ => Ok(false),
        }
    }

    /// 폐기 항목의 보존 기한.
    fn revocation_deadline(&self, claims: &Claims, now: i64) -> i64 {
        if claims.exp == 0 {
            now.saturating_add(self.ttl_secs)
                .saturating_add(self.safety_margin_secs)
        } else {
            claims.exp.saturating_add(self.safety_margin_secs)
        }
    }

    /// 갱신으로 대체된 토큰을 폐기합니다. 실패는 경고만 남깁니다.
    async fn revoke_replaced(&self, ctx: &OpContext, claims: &Claims, now: i64) {
        let Some(blocklist) = &self.blocklist else {
            debug!(subject = %claims.sub, "No blocklist configured, replaced token stays valid until expiry");
            return;
        };
        if claims.jti.is_empty() {
            return;
        }
        let not_after = self.revocation_deadline(claims, now);
        if let Err(e) = blocklist.revoke(ctx, &claims.jti, not_after).await {
            warn!(
                subject = %claims.sub,
                token_id = %claims.jti,
                error = %e,
                "Failed to revoke replaced token"
            );
        }
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> Error {
    let message = match err.kind() {
        ErrorKind::InvalidSignature => "token signature is invalid",
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            "token signing method mismatch"
        }
        ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::Base64(_) | ErrorKind::InvalidToken => {
            "token is malformed"
        }
        _ => "token is invalid",
    };
    ERR_INVALID_TOKEN.with_message(message).with_cause(err)
}

fn new_token_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    fn kind(&self) -> &'static str {
        "jwt"
    }

    async fn sign(&self, ctx: &OpContext, subject: &str, options: SignOptions) -> Result<Token> {
        ctx.check()?;
        if subject.is_empty() {
            return Err(ERR_INVALID_PARAM.with_message("subject is required"));
        }
        if let Some(key) = options.extras.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
            return Err(ERR_INVALID_PARAM.with_formatted_message(format_args!(
                "extra claim {} is reserved",
                key
            )));
        }

        let now = self.clock.now();
        let exp = options.expires_at.unwrap_or(now.saturating_add(self.ttl_secs));
        if exp <= now {
            return Err(ERR_INVALID_PARAM.with_message("expiration must be in the future"));
        }

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone().unwrap_or_default(),
            aud: options.audience.unwrap_or_else(|| self.audience.clone()),
            iat: now,
            nbf: now,
            exp,
            jti: options.token_id.unwrap_or_else(new_token_id),
            extras: options.extras,
        };

        let token = self.issue(&claims)?;
        debug!(subject = %claims.sub, token_id = %claims.jti, exp, "Token issued");
        Ok(token)
    }

    async fn verify(&self, ctx: &OpContext, token: &str) -> Result<Claims> {
        ctx.check()?;
        let claims = self.parse(token)?;
        let now = self.clock.now();
        self.check_trust(&claims, now)?;

        if self.is_revoked(ctx, &claims).await? {
            return Err(ERR_TOKEN_REVOKED.error());
        }
        if claims.exp != 0 && now > claims.exp {
            return Err(ERR_TOKEN_EXPIRED.error());
        }
        Ok(claims)
    }

    async fn refresh(&self, ctx: &OpContext, token: &str) -> Result<Token> {
        ctx.check()?;
        let previous = self.parse(token)?;
        let now = self.clock.now();
        self.check_trust(&previous, now)?;

        if previous.exp != 0 && now > previous.exp.saturating_add(self.refresh_grace_secs) {
            return Err(ERR_TOKEN_EXPIRED.with_message("token is beyond the refresh window"));
        }
        if self.is_revoked(ctx, &previous).await? {
            return Err(ERR_TOKEN_REVOKED.error());
        }

        let generation = match &self.ledger {
            Some(ledger) => {
                let next = ledger.generation(ctx, &previous.jti).await? + 1;
                if let Some(max) = self.max_refresh {
                    if next > max {
                        return Err(ERR_SESSION_EXPIRED.with_formatted_message(format_args!(
                            "refresh limit of {} reached",
                            max
                        )));
                    }
                }
                Some(next)
            }
            None => None,
        };

        let refreshed = Claims {
            sub: previous.sub.clone(),
            iss: previous.iss.clone(),
            aud: previous.aud.clone(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(self.ttl_secs),
            jti: new_token_id(),
            extras: previous.extras.clone(),
        };
        let token = self.issue(&refreshed)?;

        if let (Some(ledger), Some(generation)) = (&self.ledger, generation) {
            let not_after = refreshed
                .exp
                .saturating_add(self.refresh_grace_secs)
                .saturating_add(self.safety_margin_secs);
            ledger.record(ctx, &refreshed.jti, generation, not_after).await?;
        }
        self.revoke_replaced(ctx, &previous, now).await;

        info!(
            subject = %refreshed.sub,
            previous_id = %previous.jti,
            token_id = %refreshed.jti,
            generation = generation.unwrap_or_default(),
            "Token refreshed"
        );
        Ok(token)
    }

    async fn revoke(&self, ctx: &OpContext, token: &str) -> Result<()> {
        ctx.check()?;
        let Some(blocklist) = &self.blocklist else {
            return Err(ERR_NOT_IMPLEMENTED.with_message("token revocation requires a blocklist store"));
        };

        let claims = self.parse(token)?;
        if claims.jti.is_empty() {
            return Err(ERR_INVALID_TOKEN.with_message("token has no identifier"));
        }

        let now = self.clock.now();
        let not_after = self.revocation_deadline(&claims, now);
        if now > not_after {
            debug!(token_id = %claims.jti, "Token already past its revocation window");
            return Ok(());
        }

        blocklist.revoke(ctx, &claims.jti, not_after).await?;
        info!(subject = %claims.sub, token_id = %claims.jti, not_after, "Token revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::MemoryBlocklist;
    use crate::ledger::MemoryRefreshLedger;
    use sentinel_core::{Clock, ManualClock};
    use serde_json::json;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const START: i64 = 1_700_000_000;

    struct Fixture {
        clock: Arc<ManualClock>,
        engine: JwtAuthenticator,
        ctx: OpContext,
    }

    fn fixture(config: JwtConfig) -> Fixture {
        let clock = Arc::new(ManualClock::new(START));
        let blocklist = Arc::new(MemoryBlocklist::new(clock.clone()));
        let engine = JwtAuthenticator::new(config)
            .unwrap()
            .with_clock(clock.clone())
            .with_blocklist(blocklist);
        Fixture {
            clock,
            engine,
            ctx: OpContext::background(),
        }
    }

    #[test]
    fn test_short_key_rejected() {
        let err = JwtAuthenticator::new(JwtConfig::new("too-short")).unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let err = JwtAuthenticator::new(JwtConfig::new(KEY).with_ttl_secs(0)).unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
    }

    #[tokio::test]
    async fn test_kind_is_jwt() {
        let f = fixture(JwtConfig::new(KEY));
        assert_eq!(f.engine.kind(), "jwt");
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let f = fixture(JwtConfig::new(KEY).with_ttl_secs(60).with_issuer("sentinel"));
        let token = f
            .engine
            .sign(&f.ctx, "u1", SignOptions::new().extra("role", json!("admin")))
            .await
            .unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_at, START + 60);
        assert_eq!(token.expires_in, 60);

        let claims = f.engine.verify(&f.ctx, &token.access_token).await.unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.iss, "sentinel");
        assert_eq!(claims.iat, START);
        assert_eq!(claims.nbf, START);
        assert_eq!(claims.extra_str("role"), Some("admin"));
        assert_eq!(claims.jti.len(), 32);
    }

    #[tokio::test]
    async fn test_verify_within_ttl() {
        let f = fixture(JwtConfig::new(KEY).with_ttl_secs(60));
        let token = f.engine.sign(&f.ctx, "u1", SignOptions::new()).await.unwrap();

        for _ in 0..=6 {
            let claims = f.engine.verify(&f.ctx, &token.access_token).await.unwrap();
            assert!(claims.valid(f.clock.now()));
            f.clock.advance(10);
        }
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_EXPIRED));
    }

    #[tokio::test]
    async fn test_sign_options() {
        let f = fixture(JwtConfig::new(KEY));
        let token = f
            .engine
            .sign(
                &f.ctx,
                "u1",
                SignOptions::new()
                    .expires_at(START + 5)
                    .audience(["mobile", "web"])
                    .token_id("fixed"),
            )
            .await
            .unwrap();

        let claims = f.engine.verify(&f.ctx, &token.access_token).await.unwrap();
        assert_eq!(claims.exp, START + 5);
        assert_eq!(claims.aud, vec!["mobile", "web"]);
        assert_eq!(claims.jti, "fixed");
    }

    #[tokio::test]
    async fn test_sign_rejects_bad_input() {
        let f = fixture(JwtConfig::new(KEY));
        let err = f.engine.sign(&f.ctx, "", SignOptions::new()).await.unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));

        let err = f
            .engine
            .sign(&f.ctx, "u1", SignOptions::new().extra("exp", json!(1)))
            .await
            .unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));

        let err = f
            .engine
            .sign(&f.ctx, "u1", SignOptions::new().expires_at(START - 1))
            .await
            .unwrap_err();
        assert!(err.is(&ERR_INVALID_PARAM));
    }

    #[tokio::test]
    async fn test_verify_invalid_inputs() {
        let f = fixture(JwtConfig::new(KEY));
        for input in ["", "   ", "not.a.token", "abc"] {
            let err = f.engine.verify(&f.ctx, input).await.unwrap_err();
            assert!(err.is(&ERR_INVALID_TOKEN), "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_verify_foreign_key() {
        let f = fixture(JwtConfig::new(KEY));
        let other = fixture(JwtConfig::new("another-key-another-key-another-key"));
        let token = other.engine.sign(&other.ctx, "u1", SignOptions::new()).await.unwrap();

        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_INVALID_TOKEN));
        assert_eq!(err.message("en"), "token signature is invalid");
    }

    #[tokio::test]
    async fn test_verify_not_before() {
        let f = fixture(JwtConfig::new(KEY));
        let claims = Claims {
            sub: "u1".to_string(),
            nbf: START + 100,
            exp: START + 200,
            jti: "future".to_string(),
            ..Default::default()
        };
        let token = f.engine.issue(&claims).unwrap();

        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_INVALID_TOKEN));

        f.clock.set(START + 100);
        assert!(f.engine.verify(&f.ctx, &token.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_issuer_and_audience() {
        let issuing = fixture(JwtConfig::new(KEY).with_issuer("other"));
        let token = issuing
            .engine
            .sign(&issuing.ctx, "u1", SignOptions::new().audience(["web"]))
            .await
            .unwrap();

        let strict_issuer = fixture(JwtConfig::new(KEY).with_issuer("sentinel"));
        let err = strict_issuer
            .engine
            .verify(&strict_issuer.ctx, &token.access_token)
            .await
            .unwrap_err();
        assert!(err.is(&ERR_INVALID_TOKEN));

        let strict_audience = fixture(JwtConfig::new(KEY).with_audience(["mobile"]));
        let err = strict_audience
            .engine
            .verify(&strict_audience.ctx, &token.access_token)
            .await
            .unwrap_err();
        assert!(err.is(&ERR_INVALID_TOKEN));

        let matching = fixture(JwtConfig::new(KEY).with_audience(["web", "mobile"]));
        assert!(matching.engine.verify(&matching.ctx, &token.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_far_future_expiry() {
        let f = fixture(JwtConfig::new(KEY).with_refresh_grace_secs(60));
        let token = f
            .engine
            .sign(&f.ctx, "u1", SignOptions::new().expires_at(i64::MAX))
            .await
            .unwrap();
        assert_eq!(token.expires_at, i64::MAX);

        f.engine.revoke(&f.ctx, &token.access_token).await.unwrap();
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_REVOKED));
    }

    #[tokio::test]
    async fn test_refresh_far_future_expiry() {
        let f = fixture(JwtConfig::new(KEY).with_refresh_grace_secs(60));
        let token = f
            .engine
            .sign(&f.ctx, "u1", SignOptions::new().expires_at(i64::MAX))
            .await
            .unwrap();

        let refreshed = f.engine.refresh(&f.ctx, &token.access_token).await.unwrap();
        assert!(f.engine.verify(&f.ctx, &refreshed.access_token).await.is_ok());
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_REVOKED));
    }

    #[tokio::test]
    async fn test_revoke_then_verify() {
        let f = fixture(JwtConfig::new(KEY).with_ttl_secs(60).with_safety_margin_secs(30));
        let token = f.engine.sign(&f.ctx, "u1", SignOptions::new()).await.unwrap();

        f.engine.revoke(&f.ctx, &token.access_token).await.unwrap();
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_REVOKED));

        // 만료 이후에도 보존 기한까지는 폐기로 보고합니다.
        f.clock.set(START + 89);
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_REVOKED));

        f.clock.set(START + 91);
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_EXPIRED));
    }

    #[tokio::test]
    async fn test_revoke_without_blocklist() {
        let engine = JwtAuthenticator::new(JwtConfig::new(KEY)).unwrap();
        let ctx = OpContext::background();
        let token = engine.sign(&ctx, "u1", SignOptions::new()).await.unwrap();

        let err = engine.revoke(&ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_NOT_IMPLEMENTED));
    }

    #[tokio::test]
    async fn test_revoke_long_expired_token_is_noop() {
        let f = fixture(JwtConfig::new(KEY).with_ttl_secs(60));
        let token = f.engine.sign(&f.ctx, "u1", SignOptions::new()).await.unwrap();
        f.clock.advance(3_600);
        f.engine.revoke(&f.ctx, &token.access_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_preserves_claims() {
        let f = fixture(JwtConfig::new(KEY).with_ttl_secs(60));
        let token = f
            .engine
            .sign(
                &f.ctx,
                "u1",
                SignOptions::new().extra("role", json!("admin")).audience(["web"]),
            )
            .await
            .unwrap();

        f.clock.advance(30);
        let refreshed = f.engine.refresh(&f.ctx, &token.access_token).await.unwrap();
        assert!(refreshed.expires_at > token.expires_at);

        let claims = f.engine.verify(&f.ctx, &refreshed.access_token).await.unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.extra_str("role"), Some("admin"));
        assert_eq!(claims.aud, vec!["web"]);
        assert_eq!(claims.iat, START + 30);

        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_REVOKED));
        let err = f.engine.refresh(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_REVOKED));
    }

    #[tokio::test]
    async fn test_refresh_grace_window() {
        let f = fixture(JwtConfig::new(KEY).with_ttl_secs(60).with_refresh_grace_secs(120));
        let token = f.engine.sign(&f.ctx, "u1", SignOptions::new()).await.unwrap();

        f.clock.set(START + 150);
        let err = f.engine.verify(&f.ctx, &token.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_EXPIRED));
        assert!(f.engine.refresh(&f.ctx, &token.access_token).await.is_ok());

        let late = f.engine.sign(&f.ctx, "u2", SignOptions::new()).await.unwrap();
        f.clock.advance(181);
        let err = f.engine.refresh(&f.ctx, &late.access_token).await.unwrap_err();
        assert!(err.is(&ERR_TOKEN_EXPIRED));
    }

    #[tokio::test]
    async fn test_refresh_limit_with_ledger() {
        let clock = Arc::new(ManualClock::new(START));
        let engine = JwtAuthenticator::new(JwtConfig::new(KEY).with_ttl_secs(60).with_max_refresh(2))
            .unwrap()
            .with_clock(clock.clone())
            .with_blocklist(Arc::new(MemoryBlocklist::new(clock.clone())))
            .with_ledger(Arc::new(MemoryRefreshLedger::new(clock.clone())));
        let ctx = OpContext::background();

        let first = engine.sign(&ctx, "u1", SignOptions::new()).await.unwrap();
        clock.advance(10);
        let second = engine.refresh(&ctx, &first.access_token).await.unwrap();
        clock.advance(10);
        let third = engine.refresh(&ctx, &second.access_token).await.unwrap();
        clock.advance(10);

        let err = engine.refresh(&ctx, &third.access_token).await.unwrap_err();
        assert!(err.is(&ERR_SESSION_EXPIRED));
        // 갱신만 거부되고 검증은 만료 시각까지 성공합니다.
        assert!(engine.verify(&ctx, &third.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts() {
        let f = fixture(JwtConfig::new(KEY));
        let ctx = OpContext::background();
        ctx.cancel();
        let err = f.engine.sign(&ctx, "u1", SignOptions::new()).await.unwrap_err();
        assert!(err.is(&sentinel_core::errno::ERR_CONTEXT_CANCELED));
    }

    #[tokio::test]
    async fn test_concurrent_sign_and_verify() {
        let f = fixture(JwtConfig::new(KEY));
        let engine = Arc::new(f.engine);
        let mut handles = Vec::new();

        for i in 0..16 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let ctx = OpContext::background();
                let subject = format!("user-{}", i);
                let token = engine.sign(&ctx, &subject, SignOptions::new()).await.unwrap();
                let claims = engine.verify(&ctx, &token.access_token).await.unwrap();
                assert_eq!(claims.sub, subject);
                claims.jti
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 16);
    }
}
