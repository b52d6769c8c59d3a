//! Shared `PostgreSQL` session store tests.
//!
//! These need a database:
//!
//! ```bash
//! STOREFRONT_DATABASE_URL=postgres://localhost/katale_test \
//!     cargo test -p katale-integration-tests --test session_store -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::time::Duration;

use katale_storefront::db;
use katale_storefront::middleware::{create_session_store, spawn_expired_deletion};
use katale_storefront::models::{CurrentUser, session_keys};
use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;
use tower_sessions::SessionStore;
use tower_sessions::cookie::time::{self, OffsetDateTime};
use tower_sessions::session::{Id, Record};

async fn pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL").unwrap();
    db::create_pool(&SecretString::from(url)).await.unwrap()
}

fn record(expires_in: time::Duration) -> Record {
    Record {
        id: Id::default(),
        data: HashMap::from([(
            session_keys::CURRENT_USER.to_string(),
            json!({ "id": "usr_pg", "email": "shopper@katale.ug" }),
        )]),
        expiry_date: OffsetDateTime::now_utc() + expires_in,
    }
}

async fn stored_rows(pool: &PgPool, id: &Id) -> i64 {
    sqlx::query_scalar(r#"SELECT count(*) FROM "tower_sessions"."session" WHERE id = $1"#)
        .bind(id.to_string())
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at STOREFRONT_DATABASE_URL"]
async fn test_identity_written_by_another_service_is_readable() {
    let pool = pool().await;
    let store = create_session_store(&pool).await.unwrap();

    // What the sign-in service does
    let mut written = record(time::Duration::hours(1));
    store.create(&mut written).await.unwrap();

    let loaded = store.load(&written.id).await.unwrap().unwrap();
    let user: CurrentUser =
        serde_json::from_value(loaded.data[session_keys::CURRENT_USER].clone()).unwrap();
    assert_eq!(user.id.as_str(), "usr_pg");

    store.delete(&written.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at STOREFRONT_DATABASE_URL"]
async fn test_expired_sessions_are_purged() {
    let pool = pool().await;
    let store = create_session_store(&pool).await.unwrap();

    let mut expired = record(-time::Duration::minutes(1));
    store.create(&mut expired).await.unwrap();
    assert_eq!(stored_rows(&pool, &expired.id).await, 1);

    let task = spawn_expired_deletion(store);
    tokio::time::sleep(Duration::from_millis(500)).await;
    task.abort();

    assert_eq!(stored_rows(&pool, &expired.id).await, 0);
}
