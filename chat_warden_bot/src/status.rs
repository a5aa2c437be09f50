//! Read-only JSON status endpoints, mostly for the hosting platform's
//! liveness probes.

use std::{net::SocketAddr, sync::Arc, time::Instant};

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::moderation::Moderator;

#[derive(Clone)]
struct StatusContext {
    moderator: Arc<Moderator>,
    started: Instant,
}

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    bot_running: bool,
    warnings_count: usize,
    blacklist_count: usize,
}

#[derive(Serialize)]
struct Stats {
    total_warnings_issued: u64,
    users_with_warnings: usize,
    blacklisted_users: usize,
    monitored_groups: usize,
    monitored_topics: usize,
}

fn router(moderator: Arc<Moderator>) -> Router {
    let context = StatusContext {
        moderator,
        started: Instant::now(),
    };
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(context)
}

/// Binds and serves the status endpoints until the process dies.
///
/// # Panics
///
/// Panics if the port can't be bound.
pub async fn serve(moderator: Arc<Moderator>, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind the status server port!");

    log::info!("Status server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, router(moderator)).await {
        log::error!("Status server died: {}", e);
    }
}

async fn liveness(State(context): State<StatusContext>) -> Json<Liveness> {
    Json(Liveness {
        status: "Bot is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: context.started.elapsed().as_secs(),
    })
}

async fn health(State(context): State<StatusContext>) -> Json<Health> {
    let stats = context.moderator.stats();
    Json(Health {
        status: "healthy",
        bot_running: true,
        warnings_count: stats.users_with_warnings,
        blacklist_count: stats.blacklisted_users,
    })
}

async fn stats(State(context): State<StatusContext>) -> Json<Stats> {
    let moderation = context.moderator.stats();
    let config = context.moderator.config();
    Json(Stats {
        total_warnings_issued: moderation.total_warnings_issued,
        users_with_warnings: moderation.users_with_warnings,
        blacklisted_users: moderation.blacklisted_users,
        monitored_groups: config.monitored_chats.len(),
        monitored_topics: config.monitored_threads.len(),
    })
}
