//! Galletas API library
//!
//! Cookie inventory for the bakery: the catalog with derived box stock,
//! product creation across packaging types and batch shrinkage recording.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{config::AppConfig, db::DbPool};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

/// Full application router: cookie pages under the configured mount path,
/// health probes, and the OpenAPI document with its Swagger UI.
pub fn app_router(state: AppState) -> Router {
    let mount_path = state.config.mount_path.clone();

    Router::new()
        .route("/", get(|| async { "galletas-api up" }))
        .nest(&mount_path, handlers::galletas::galletas_routes())
        .nest("/health", health::health_routes(state.db.clone()))
        .merge(openapi::swagger_ui(&mount_path))
        .with_state(state)
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}
