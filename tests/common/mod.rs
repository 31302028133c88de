#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use galletas_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::{cookie, cookie_batch, packaging_type, recipe},
    forms::CreateCookie,
    services::{catalog, cookies},
    AppState,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness for spinning up the application against an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with a freshly migrated database.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // Every connection to `sqlite::memory:` is its own database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(pool, cfg);
        let router = galletas_api::app_router(state.clone());
        Self { router, state }
    }

    pub fn db(&self) -> &DbPool {
        self.state.db.as_ref()
    }

    pub fn flash_cookie_name(&self) -> &str {
        &self.state.config.flash_cookie_name
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).expect("failed to build request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_recipe(&self, name: &str, active: bool) -> recipe::Model {
        recipe::ActiveModel {
            name: Set(name.to_string()),
            active: Set(active),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed recipe")
    }

    /// Creates `name` in every packaging type and returns the unit row.
    pub async fn seed_cookie(&self, name: &str, recipe: &recipe::Model) -> cookie::Model {
        let active = catalog::active_recipe_choices(self.db())
            .await
            .expect("load recipes");
        let txn = self.db().begin().await.expect("begin");
        let outcome = cookies::create_cookie(
            &txn,
            &active,
            CreateCookie {
                name: name.to_string(),
                recipe_id: recipe.id,
            },
        )
        .await;
        let rows = db::finish_transaction(txn, outcome)
            .await
            .expect("seed cookie");

        let unit = self.packaging(packaging_type::UNIT).await;
        rows.into_iter()
            .find(|row| row.packaging_type_id == unit.id)
            .expect("unit row created")
    }

    pub async fn seed_batch(
        &self,
        cookie_id: i32,
        produced_on: &str,
        quantity: i32,
    ) -> cookie_batch::Model {
        cookie_batch::ActiveModel {
            cookie_id: Set(cookie_id),
            produced_on: Set(date(produced_on)),
            quantity: Set(quantity),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed batch")
    }

    pub async fn batch(&self, id: i32) -> cookie_batch::Model {
        cookie_batch::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("load batch")
            .expect("batch exists")
    }

    pub async fn packaging(&self, name: &str) -> packaging_type::Model {
        packaging_type::Entity::find()
            .filter(packaging_type::Column::Name.eq(name))
            .one(self.db())
            .await
            .expect("load packaging")
            .expect("packaging type seeded")
    }
}

/// Cookie with batches of 10 (2024-01-01) and 5 (2024-02-01).
pub struct Chocolate {
    pub cookie: cookie::Model,
    pub january: cookie_batch::Model,
    pub february: cookie_batch::Model,
}

pub async fn chocolate(app: &TestApp) -> Chocolate {
    let recipe = app.seed_recipe("Base chocolate", true).await;
    let cookie = app.seed_cookie("Chocolate", &recipe).await;
    // Inserted newest first so FIFO cannot lean on insertion order.
    let february = app.seed_batch(cookie.id, "2024-02-01", 5).await;
    let january = app.seed_batch(cookie.id, "2024-01-01", 10).await;
    Chocolate {
        cookie,
        january,
        february,
    }
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// The `name=value` pair of a non-empty flash cookie set by `response`.
pub fn flash_cookie(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&prefix) && pair.len() > prefix.len())
        .map(str::to_string)
}
