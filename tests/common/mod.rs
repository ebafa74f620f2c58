//! Backend helpers shared by the integration tests
//!
//! Tests can be filtered by database backend using the DATABASE_BACKEND environment variable:
//! - `DATABASE_BACKEND=sqlite cargo test` - Run only SQLite tests
//! - `DATABASE_BACKEND=postgres cargo test` - Run only PostgreSQL tests
//! - By default, both backends are tested; PostgreSQL tests are skipped without DATABASE_URL
//!
//! Each PostgreSQL test runs in a schema of its own, so windowed totals
//! only ever see the rows that test inserted.

#![allow(dead_code, unused_macros)]

use cicerone::storage::{PostgresStorage, SqliteStorage, Storage};
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;

/// Get the database backend to test from environment variable
pub fn should_test_backend(backend: &str) -> bool {
    match std::env::var("DATABASE_BACKEND") {
        Ok(val) => val.to_lowercase() == backend.to_lowercase(),
        Err(_) => true,
    }
}

pub async fn create_sqlite_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

/// Run `scenario` against a fresh in-memory SQLite database
pub async fn with_sqlite<F, Fut>(scenario: F)
where
    F: FnOnce(Arc<dyn Storage>) -> Fut,
    Fut: Future<Output = ()>,
{
    if !should_test_backend("sqlite") {
        return;
    }
    scenario(create_sqlite_storage().await).await;
}

/// Run `scenario` against a scratch schema in the DATABASE_URL database
///
/// Skipped when DATABASE_URL does not point at PostgreSQL. The schema is
/// dropped once the scenario completes.
pub async fn with_postgres<F, Fut>(scenario: F)
where
    F: FnOnce(Arc<dyn Storage>) -> Fut,
    Fut: Future<Output = ()>,
{
    if !should_test_backend("postgres") {
        return;
    }
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        return;
    };
    if !db_url.starts_with("postgres") {
        return;
    }

    let admin = PgPool::connect(&db_url).await.unwrap();
    let schema = format!("cicerone_test_{:016x}", rand::random::<u64>());
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .unwrap();

    let separator = if db_url.contains('?') { '&' } else { '?' };
    let scoped_url = format!("{db_url}{separator}options=-c%20search_path%3D{schema}");
    let storage = PostgresStorage::new(&scoped_url, 5).await.unwrap();
    storage.init().await.unwrap();

    scenario(Arc::new(storage)).await;

    sqlx::query(&format!("DROP SCHEMA {schema} CASCADE"))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;
}

/// Generate one `#[tokio::test]` per backend for each scenario
///
/// Every scenario is an `async fn(Arc<dyn Storage>)`; the tests land in
/// `sqlite::<scenario>` and `postgres::<scenario>`. Needs `#[macro_use] mod common;`.
macro_rules! backend_tests {
    ($($scenario:ident),* $(,)?) => {
        mod sqlite {
            $(
                #[tokio::test]
                async fn $scenario() {
                    crate::common::with_sqlite(super::$scenario).await;
                }
            )*
        }

        mod postgres {
            $(
                #[tokio::test]
                async fn $scenario() {
                    crate::common::with_postgres(super::$scenario).await;
                }
            )*
        }
    };
}
