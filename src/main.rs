mod advertisements;
mod app;
mod auth;
mod config;
mod error;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "adboard=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    if let Some(seed) = app_state.config.admin.clone() {
        users::services::seed_admin(&app_state, &seed).await?;
    }

    tracing::info!(
        token_ttl_sec = app_state.config.token_ttl_sec,
        hash_workers = app_state.config.hash.workers,
        "configuration loaded"
    );

    app::serve(app::build_app(app_state)).await
}
