//! Lookups against a live Postgres database
//!
//! These tests need `DATABASE_URL` and are ignored by default:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/remote_select cargo test -- --ignored
//! ```

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use remote_select::{
    EntityLookup, IdEncoding, LookupConfig, LookupEngine, LookupId, PgSource, ResultPair,
    SearchRequest, SelectRemoteField, PAGE_SIZE,
};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("connect to DATABASE_URL")
}

/// A uniquely named scratch table, dropped by the caller
fn scratch_table(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_search_ranking_and_pagination() {
    let pool = pool().await;
    let table = scratch_table("rs_hosts");
    sqlx::query(&format!(
        "CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL)"
    ))
    .execute(&pool)
    .await
    .unwrap();

    for name in ["betalpha", "alphabet", "web alpha", "Alpha", "gamma"] {
        sqlx::query(&format!("INSERT INTO {table} (name) VALUES ($1)"))
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
    }
    for i in 0..PAGE_SIZE {
        sqlx::query(&format!("INSERT INTO {table} (name) VALUES ($1)"))
            .bind(format!("zz{i:03}"))
            .execute(&pool)
            .await
            .unwrap();
    }

    let lookup = EntityLookup::new(
        "hosts",
        LookupConfig::new(format!("{table} h"), "h.id").with_text_columns(["h.name"]),
    )
    .unwrap();
    let engine = LookupEngine::new(Arc::new(PgSource::new(pool.clone())));

    let page = engine
        .search(&lookup, &SearchRequest::new("alpha", 1))
        .await
        .unwrap();
    let texts: Vec<&str> = page.results.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["Alpha", "web alpha", "alphabet", "betalpha"]);
    assert!(!page.more);
    assert!(page.echoed_query.contains("h.name::text ILIKE $1"));

    let first = engine
        .search(&lookup, &SearchRequest::default())
        .await
        .unwrap();
    assert_eq!(first.results.len(), PAGE_SIZE);
    assert!(first.more);

    let second = engine
        .search(&lookup, &SearchRequest::new("", 2))
        .await
        .unwrap();
    assert_eq!(second.results.len(), 5);
    assert!(!second.more);

    let pct = engine
        .search(&lookup, &SearchRequest::new("%", 1))
        .await
        .unwrap();
    assert!(pct.results.is_empty());

    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_uuid_bytes_lookup_by_id() {
    let pool = pool().await;
    let table = scratch_table("rs_sites");
    sqlx::query(&format!(
        "CREATE TABLE {table} (uuid BYTEA PRIMARY KEY, name TEXT NOT NULL, city TEXT)"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let id = Uuid::new_v4();
    sqlx::query(&format!(
        "INSERT INTO {table} (uuid, name, city) VALUES ($1, $2, $3)"
    ))
    .bind(id.as_bytes().to_vec())
    .bind("HQ")
    .bind("Berlin")
    .execute(&pool)
    .await
    .unwrap();

    let lookup = EntityLookup::new(
        "sites",
        LookupConfig::new(table.clone(), "uuid")
            .with_text_columns(["name", "city"])
            .with_id_encoding(IdEncoding::UuidBytes),
    )
    .unwrap();
    let engine = LookupEngine::new(Arc::new(PgSource::new(pool.clone())));
    let canonical = id.to_string();

    assert_eq!(
        engine
            .lookup_by_id(&lookup, &LookupId::from(canonical.as_str()))
            .await
            .unwrap(),
        Some(ResultPair::new(canonical.clone(), "HQ Berlin"))
    );
    assert!(engine
        .has_id(&lookup, &LookupId::from(canonical.as_str()))
        .await
        .unwrap());
    assert!(!engine
        .has_id(&lookup, &LookupId::from(Uuid::new_v4().to_string()))
        .await
        .unwrap());

    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rejected_query_propagates() {
    let lookup = EntityLookup::new(
        "missing",
        LookupConfig::new(scratch_table("rs_missing"), "id").with_text_columns(["name"]),
    )
    .unwrap();
    let engine = LookupEngine::new(Arc::new(PgSource::new(pool().await)));

    let err = engine
        .search(&lookup, &SearchRequest::default())
        .await
        .unwrap_err();
    assert!(err.is_query_error());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_text_ids_against_integer_key() {
    let pool = pool().await;
    let table = scratch_table("rs_keys");
    sqlx::query(&format!(
        "CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL)"
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(&format!("INSERT INTO {table} (name) VALUES ('alpha')"))
        .execute(&pool)
        .await
        .unwrap();

    let lookup = Arc::new(
        EntityLookup::new(
            "keys",
            LookupConfig::new(table.clone(), "id").with_text_columns(["name"]),
        )
        .unwrap(),
    );
    let engine = LookupEngine::new(Arc::new(PgSource::new(pool.clone())));

    for id in [LookupId::from("1"), LookupId::Int(1)] {
        assert_eq!(
            engine.lookup_by_id(&lookup, &id).await.unwrap(),
            Some(ResultPair::new("1", "alpha"))
        );
        assert!(engine.has_id(&lookup, &id).await.unwrap());
    }

    let mut field = SelectRemoteField::with_lookup("key", Arc::new(engine.bind(lookup)));
    field.set_value("1").await.unwrap();
    assert_eq!(field.option_label("1"), Some("alpha"));
    field.set_value(vec!["1".to_string()]).await.unwrap();
    assert!(field.is_valid_choice().await.unwrap());

    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_numeric_label_column() {
    let pool = pool().await;
    let table = scratch_table("rs_volumes");
    sqlx::query(&format!(
        "CREATE TABLE {table} (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, size NUMERIC, active BOOL)"
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "INSERT INTO {table} (name, size, active) VALUES ('disk', 40.5, true)"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let lookup = EntityLookup::new(
        "volumes",
        LookupConfig::new(table.clone(), "id").with_text_columns(["name", "size", "active"]),
    )
    .unwrap();
    let engine = LookupEngine::new(Arc::new(PgSource::new(pool.clone())));

    let page = engine
        .search(&lookup, &SearchRequest::new("40", 1))
        .await
        .unwrap();
    assert_eq!(page.results, vec![ResultPair::new("1", "disk 40.5 true")]);

    assert_eq!(
        engine
            .lookup_by_id(&lookup, &LookupId::from("1"))
            .await
            .unwrap(),
        Some(ResultPair::new("1", "disk 40.5 true"))
    );

    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&pool)
        .await
        .unwrap();
}
