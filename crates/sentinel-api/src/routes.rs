//! 라우터와 핸들러.
//!
//! - `GET /health`: 헬스 체크 (인증 없음)
//! - `POST /auth/refresh`: 토큰 갱신 (인증 없음, 본문의 토큰 사용)
//! - `POST /auth/revoke`: 현재 요청의 토큰 폐기
//! - `GET|PUT|DELETE /api/v1/posts/{id}`: 인가 대상 데모 리소스
//! - `GET|POST|DELETE /api/v1/policies`: 정책 규칙 조회/추가/삭제
//! - `GET /api/v1/roles/{subject}`: 주체의 역할 (상속 포함)

use axum::{
    extract::{Path, State},
    http::Extensions,
    middleware,
    routing::{get, post},
    Json, Router,
};
use sentinel_auth::{Authenticator, Token};
use sentinel_authz::{PolicyEngine, Rule};
use sentinel_core::errno::ERR_UNAUTHORIZED;
use sentinel_core::OpContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::{token_from, AuthPrincipal};
use crate::middleware::{auth_middleware, authz_middleware, AuthLayerConfig, AuthzLayerConfig};
use crate::response::{localize_errors, ok, ApiError, ApiResponse};

/// 핸들러 공용 상태.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<dyn Authenticator>,
    pub engine: PolicyEngine,
}

impl AppState {
    pub fn new(authenticator: Arc<dyn Authenticator>, engine: PolicyEngine) -> Self {
        Self {
            authenticator,
            engine,
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// 적재된 정책 규칙 수
    pub rules: usize,
}

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rules: state.engine.rules().len(),
    })
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Token> {
    let token = state
        .authenticator
        .refresh(&OpContext::background(), &body.token)
        .await?;
    Ok(ok(token))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

async fn revoke_token(
    State(state): State<AppState>,
    extensions: Extensions,
) -> ApiResult<RevokeResponse> {
    let token = token_from(&extensions)
        .ok_or_else(|| ERR_UNAUTHORIZED.with_message("no authenticated token"))?;
    state
        .authenticator
        .revoke(&OpContext::background(), token)
        .await?;
    Ok(ok(RevokeResponse { revoked: true }))
}

/// 데모 리소스 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub subject: String,
    pub action: String,
}

fn post_response(id: String, principal: &AuthPrincipal, action: &str) -> PostResponse {
    PostResponse {
        id,
        subject: principal.0.subject().to_string(),
        action: action.to_string(),
    }
}

async fn get_post(principal: AuthPrincipal, Path(id): Path<String>) -> ApiResult<PostResponse> {
    Ok(ok(post_response(id, &principal, "read")))
}

async fn update_post(principal: AuthPrincipal, Path(id): Path<String>) -> ApiResult<PostResponse> {
    Ok(ok(post_response(id, &principal, "update")))
}

async fn delete_post(principal: AuthPrincipal, Path(id): Path<String>) -> ApiResult<PostResponse> {
    Ok(ok(post_response(id, &principal, "delete")))
}

/// 정책 규칙 요청 본문.
#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub ptype: String,
    pub values: Vec<String>,
}

impl RuleRequest {
    fn into_rule(self) -> Result<Rule, ApiError> {
        Ok(Rule::new(self.ptype, self.values)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeResponse {
    pub changed: bool,
}

async fn list_policies(State(state): State<AppState>) -> ApiResult<Vec<Rule>> {
    Ok(ok(state.engine.rules()))
}

async fn add_policy(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(body): Json<RuleRequest>,
) -> ApiResult<ChangeResponse> {
    let rule = body.into_rule()?;
    let changed = state
        .engine
        .add_rule(&OpContext::background(), rule.clone())
        .await?;
    tracing::info!(subject = principal.subject(), %rule, changed, "Policy rule added");
    Ok(ok(ChangeResponse { changed }))
}

async fn remove_policy(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(body): Json<RuleRequest>,
) -> ApiResult<ChangeResponse> {
    let rule = body.into_rule()?;
    let changed = state
        .engine
        .remove_rule(&OpContext::background(), rule.clone())
        .await?;
    tracing::info!(subject = principal.subject(), %rule, changed, "Policy rule removed");
    Ok(ok(ChangeResponse { changed }))
}

async fn roles_of(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> ApiResult<Vec<String>> {
    Ok(ok(state.engine.roles_for(&subject)))
}

/// 라우터를 구성합니다.
///
/// 인증 미들웨어가 먼저 실행되고, 인가 미들웨어가 그 안쪽에서 주체를 읽습니다.
/// 가장 바깥의 [`localize_errors`]가 핸들러 에러를 요청 로케일로 맞춥니다.
pub fn build_router(
    state: AppState,
    auth: Arc<AuthLayerConfig>,
    authz: Arc<AuthzLayerConfig>,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/revoke", post(revoke_token))
        .route(
            "/api/v1/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/api/v1/policies",
            get(list_policies).post(add_policy).delete(remove_policy),
        )
        .route("/api/v1/roles/{subject}", get(roles_of))
        .layer(middleware::from_fn_with_state(authz, authz_middleware))
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .layer(middleware::from_fn(localize_errors))
        .with_state(state)
}

/// 바이너리와 테스트가 공유하는 기본 미들웨어 설정.
///
/// `/health`와 `/auth/refresh`는 인증을 건너뛰고, `/auth/` 아래는 인가를
/// 건너뜁니다.
pub fn default_layers(state: &AppState) -> (Arc<AuthLayerConfig>, Arc<AuthzLayerConfig>) {
    let auth = AuthLayerConfig::new(state.authenticator.clone())
        .skip_path("/health")
        .skip_path("/auth/refresh");
    let authz = AuthzLayerConfig::new(Arc::new(state.engine.clone()))
        .skip_path("/health")
        .skip_prefix("/auth/");
    (Arc::new(auth), Arc::new(authz))
}
