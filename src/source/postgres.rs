//! PostgreSQL data source
//!
//! Renders the query model through `sqlx::QueryBuilder`: configured table and
//! column names are pushed as SQL text, every value (search patterns,
//! identifiers) is pushed with `push_bind`. Label columns arrive cast to
//! text, so only id columns need typed decoding.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Postgres, QueryBuilder, Row as _, TypeInfo};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{LookupError, Result};
use crate::lookup::{DataSource, Row, SelectQuery, SqlSink, Value};

/// Data source over a shared Postgres pool
#[derive(Clone)]
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the connection string named by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = std::env::var(&config.connection_string_env).map_err(|_| {
            LookupError::config(format!(
                "Environment variable '{}' is not set",
                config.connection_string_env
            ))
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "Connected to database"
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

struct PgSink(QueryBuilder<'static, Postgres>);

impl SqlSink for PgSink {
    fn push_sql(&mut self, sql: &str) {
        self.0.push(sql);
    }

    fn push_value(&mut self, value: Value) {
        match value {
            Value::Null => self.0.push_bind(None::<String>),
            Value::Int(v) => self.0.push_bind(v),
            Value::Text(v) => self.0.push_bind(v),
            Value::Bytes(v) => self.0.push_bind(v),
            Value::Uuid(v) => self.0.push_bind(v),
        };
    }
}

/// Build the Postgres query for `query`
pub fn build_query(query: &SelectQuery) -> QueryBuilder<'static, Postgres> {
    let mut sink = PgSink(QueryBuilder::new(""));
    query.render(&mut sink);
    sink.0
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let i = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => Value::from(row.try_get::<Option<i16>, _>(i)?.map(i64::from)),
            "INT4" => Value::from(row.try_get::<Option<i32>, _>(i)?.map(i64::from)),
            "INT8" => Value::from(row.try_get::<Option<i64>, _>(i)?),
            "BYTEA" => Value::from(row.try_get::<Option<Vec<u8>>, _>(i)?),
            "UUID" => Value::from(row.try_get::<Option<Uuid>, _>(i)?),
            _ => Value::from(row.try_get::<Option<String>, _>(i)?),
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}

#[async_trait]
impl DataSource for PgSource {
    async fn fetch_all(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let mut builder = build_query(query);
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn fetch_optional(&self, query: &SelectQuery) -> Result<Option<Row>> {
        let mut builder = build_query(query);
        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn fetch_count(&self, query: &SelectQuery) -> Result<i64> {
        let mut builder = build_query(query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn describe(&self, query: &SelectQuery) -> String {
        build_query(query).sql().to_string()
    }
}
