//! Sentinel 요청 파이프라인.
//!
//! axum 라우터에 인증/인가 미들웨어를 끼워 넣는 구성 요소를 제공합니다.
//!
//! # 구성
//!
//! - [`middleware`]: 자격 증명 추출/토큰 검증, 경로와 메서드 기반 정책 판정
//! - [`context`]: 요청 범위의 Claims/Principal 접근자
//! - [`response`]: `{code, message, data}` 응답 봉투
//! - [`routes`]: 데모 라우터와 토큰 관리 핸들러

pub mod context;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod routes;

pub use context::{claims_from, inject_auth, subject_from, token_from, AuthClaims, AuthPrincipal};
pub use middleware::{
    auth_middleware, authz_middleware, default_action, default_object, AuthLayerConfig,
    AuthzLayerConfig, SkipRules, TokenSource,
};
pub use response::{localize_errors, ok, ApiError, ApiResponse};
pub use routes::{build_router, default_layers, AppState};
