//! Sentinel API 서버.
//!
//! 설정을 읽어 토큰 엔진, 차단 목록, 정책 엔진을 구성하고 인증/인가
//! 미들웨어가 적용된 axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use sentinel_api::{build_router, default_layers, AppState};
use sentinel_auth::{
    BlocklistStore, JwtAuthenticator, JwtConfig, MemoryBlocklist, MemoryRefreshLedger,
    RedisBlocklist, RedisBlocklistConfig,
};
use sentinel_authz::{
    parse_rules, LocalWatcher, MemoryPolicyStore, PolicyEngine, PolicyEngineConfig, PolicyStore,
    RedisPolicyStore, RedisPolicyStoreConfig, RedisWatcher, Watcher,
};
use sentinel_core::{
    init_logging, system_clock, AppConfig, Backend, BlocklistConfig, LogConfig, OpContext,
    PolicyConfig, SharedClock,
};
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// 요청 처리 제한 시간.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (없으면 무시)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;
    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Sentinel API server");

    let clock = system_clock();
    let blocklist = build_blocklist(&config.blocklist, clock.clone()).await?;

    let max_refresh = config.auth.max_refresh;
    let mut authenticator = JwtAuthenticator::new(JwtConfig::from(config.auth))
        .context("invalid token engine configuration")?
        .with_clock(clock.clone())
        .with_blocklist(blocklist.clone());
    if max_refresh.is_some() {
        authenticator = authenticator.with_ledger(Arc::new(MemoryRefreshLedger::new(clock)));
    }

    let engine = build_policy_engine(&config.policy).await?;
    info!(rules = engine.rules().len(), "Policy engine ready");

    let state = AppState::new(Arc::new(authenticator), engine.clone());
    let (auth_layer, authz_layer) = default_layers(&state);
    let app = build_router(state, auth_layer, authz_layer)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    let shutdown_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await
        .context("server error")?;

    if let Err(e) = engine.close().await {
        warn!(error = %e, "Failed to close policy engine");
    }
    if let Err(e) = blocklist.close().await {
        warn!(error = %e, "Failed to close blocklist store");
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// 차단 목록 저장소 구성.
async fn build_blocklist(
    config: &BlocklistConfig,
    clock: SharedClock,
) -> anyhow::Result<Arc<dyn BlocklistStore>> {
    let store: Arc<dyn BlocklistStore> = match config.backend {
        Backend::Memory => {
            let interval = Duration::from_secs(config.sweep_interval_secs.max(1));
            info!(sweep_interval = ?interval, "Using in-memory blocklist");
            Arc::new(MemoryBlocklist::with_sweeper(clock, interval))
        }
        Backend::Redis => {
            let redis_config = RedisBlocklistConfig {
                url: config.redis_url.clone(),
                key_prefix: config.key_prefix.clone(),
            };
            Arc::new(
                RedisBlocklist::connect(&redis_config, clock)
                    .await
                    .context("failed to connect blocklist store")?,
            )
        }
    };
    Ok(store)
}

/// 정책 저장소, 초기 규칙, 변경 감시자를 구성합니다.
async fn build_policy_engine(config: &PolicyConfig) -> anyhow::Result<PolicyEngine> {
    let ctx = OpContext::background();

    let store: Arc<dyn PolicyStore> = match config.backend {
        Backend::Memory => Arc::new(MemoryPolicyStore::new()),
        Backend::Redis => {
            let redis_config = RedisPolicyStoreConfig {
                url: config.redis_url.clone(),
                key: config.key.clone(),
            };
            Arc::new(
                RedisPolicyStore::connect(&redis_config)
                    .await
                    .context("failed to connect policy store")?,
            )
        }
    };

    if let Some(path) = &config.seed_file {
        seed_policies(&ctx, store.as_ref(), path).await?;
    }

    let mut engine_config = PolicyEngineConfig::default();
    if let Some(role) = &config.super_admin {
        engine_config = engine_config.with_super_admin(role.clone());
    }
    let engine = PolicyEngine::load(&ctx, store, engine_config)
        .await
        .context("failed to load policies")?;

    let watcher: Arc<dyn Watcher> = match config.backend {
        Backend::Memory => Arc::new(LocalWatcher::new()),
        Backend::Redis => Arc::new(
            RedisWatcher::connect(&config.redis_url, config.watcher_channel.clone())
                .await
                .context("failed to connect policy watcher")?,
        ),
    };
    engine
        .set_watcher(watcher)
        .await
        .context("failed to subscribe policy watcher")?;

    Ok(engine)
}

/// 저장소가 비어 있으면 규칙 파일을 불러옵니다.
async fn seed_policies(ctx: &OpContext, store: &dyn PolicyStore, path: &str) -> anyhow::Result<()> {
    if !store.load_all(ctx).await?.is_empty() {
        info!(path, "Policy store already populated, skipping seed file");
        return Ok(());
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read policy seed file {path}"))?;
    let rules = parse_rules(&text)?;
    store.save_all(ctx, &rules).await?;
    info!(path, count = rules.len(), "Seeded policy store");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
