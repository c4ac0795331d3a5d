//! 인증기 계약.

use async_trait::async_trait;
use sentinel_core::{OpContext, Result};

use crate::claims::Claims;
use crate::token::{SignOptions, Token};

/// 토큰 발급/검증/갱신/폐기 계약.
///
/// 모든 호출은 [`OpContext`]의 마감과 취소를 따릅니다.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// 인증기 종류 (기본 구현은 "jwt").
    fn kind(&self) -> &'static str;

    /// 주체에 대한 토큰을 발급합니다.
    async fn sign(&self, ctx: &OpContext, subject: &str, options: SignOptions) -> Result<Token>;

    /// 토큰을 검증하고 Claims를 반환합니다.
    async fn verify(&self, ctx: &OpContext, token: &str) -> Result<Claims>;

    /// 갱신 허용 구간 안의 토큰으로 새 토큰을 발급하고 이전 토큰을 폐기합니다.
    async fn refresh(&self, ctx: &OpContext, token: &str) -> Result<Token>;

    /// 토큰을 폐기합니다.
    async fn revoke(&self, ctx: &OpContext, token: &str) -> Result<()>;
}
