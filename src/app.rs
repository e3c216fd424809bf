/*
 * Responsibility
 * - Config → shared services → Router
 * - Filter chain composition (http layers → security headers → authorization → handlers)
 * - axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::middleware::security_headers::FrameOptions;
use crate::repos::user_repo::{InMemoryUserRepo, UserRepo, UserRow};
use crate::services::auth::policy::ROLE_MANAGERS;
use crate::services::auth::{
    AccessPolicy, Authorizer, TokenIssuer, TokenVerifier, password::hash_password,
};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,jwt_gate=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        // Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, config.frame_options);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Load the rule table: the built-in one, or the JSON file named in config.
pub fn load_policy(config: &Config) -> Result<AccessPolicy> {
    let policy = match &config.access_policy_file {
        Some(path) => AccessPolicy::from_file(path, config.policy_fallback)
            .with_context(|| format!("loading access policy from {}", path.display()))?,
        None => AccessPolicy::default_table(config.policy_fallback),
    };

    tracing::info!(
        rules = policy.rules().len(),
        fallback = ?config.policy_fallback,
        "access policy loaded"
    );
    Ok(policy)
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let policy = Arc::new(load_policy(config)?);
    let verifier = Arc::new(TokenVerifier::from_config(config));
    let authorizer = Authorizer::new(policy, verifier);

    let issuer = Arc::new(TokenIssuer::from_config(config));

    let users: Arc<dyn UserRepo> = Arc::new(InMemoryUserRepo::new());
    if let Some(manager) = &config.bootstrap_manager {
        let password_hash = hash_password(manager.password.clone(), config.bcrypt_cost).await?;
        users
            .create(UserRow {
                id: Uuid::new_v4(),
                name: manager.username.clone(),
                username: manager.username.clone(),
                password_hash,
                roles: vec![ROLE_MANAGERS.to_string()],
            })
            .await
            .context("seeding bootstrap manager")?;
        tracing::info!(username = %manager.username, "bootstrap manager created");
    }

    let dummy_password_hash =
        hash_password(Uuid::new_v4().to_string(), config.bcrypt_cost).await?;

    Ok(AppState::new(
        authorizer,
        issuer,
        users,
        config.bcrypt_cost,
        dummy_password_hash,
    ))
}

pub fn build_router(state: AppState, frame_options: FrameOptions) -> Router {
    let api = middleware::auth::access::apply(api::v1::routes(), state.clone());

    let router = Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state);

    let router = middleware::security_headers::apply(router, frame_options);
    middleware::http::apply(router)
}
