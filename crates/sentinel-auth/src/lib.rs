//! Sentinel 인증 모듈.
//!
//! 주체(Principal)와 Claims, JWT 토큰 엔진, 토큰 폐기 차단 목록을 제공합니다.
//!
//! # 구성
//!
//! - [`claims`]: 토큰에 담기는 Claims와 요청에 부착되는 Principal
//! - [`jwt`]: HS256 토큰 발급/검증/갱신/폐기
//! - [`blocklist`]: 폐기된 토큰 ID 저장소 (메모리, Redis)
//! - [`ledger`]: 갱신 세대 원장

pub mod authenticator;
pub mod blocklist;
pub mod claims;
pub mod error;
pub mod jwt;
pub mod ledger;
pub mod token;

pub use authenticator::Authenticator;
pub use blocklist::{BlocklistStore, MemoryBlocklist, RedisBlocklist, RedisBlocklistConfig};
pub use claims::{Claims, Principal, RESERVED_CLAIMS, TENANT_CLAIM};
pub use error::StoreError;
pub use jwt::{JwtAuthenticator, JwtConfig};
pub use ledger::{MemoryRefreshLedger, RefreshLedger};
pub use token::{SignOptions, Token, BEARER};
