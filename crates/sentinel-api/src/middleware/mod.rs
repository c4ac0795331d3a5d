//! 인증/인가 미들웨어.
//!
//! 두 미들웨어 모두 `axum::middleware::from_fn_with_state`로 `Arc` 설정을
//! 상태로 받아 적용합니다. 인증이 바깥쪽, 인가가 안쪽에 있어야 합니다.

mod auth;
mod authz;
mod skip;

pub use auth::{auth_middleware, AuthLayerConfig, ErrorHandler, SuccessHandler, TokenSource};
pub use authz::{
    authz_middleware, default_action, default_object, AuthzLayerConfig, RequestExtractor,
};
pub use skip::SkipRules;
