use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::types::TableName;

/// A raw document copied from an upstream collection.
#[derive(Debug, Clone, FromRow)]
pub struct StagedObjectRow {
    pub id: i64,
    /// Business identifier of the document in the source system.
    pub object_id: String,
    pub object_value: Json<Value>,
    pub update_ts: NaiveDateTime,
}

/// Creates the append-only staging table for one upstream collection.
pub async fn create_staging_table(pool: &PgPool, table: &TableName) -> sqlx::Result<()> {
    let table = table.as_quoted_identifier();
    let ddl = format!(
        r#"
        create table if not exists {table} (
            id bigint not null primary key generated always as identity,
            object_id varchar not null,
            object_value jsonb not null,
            update_ts timestamp not null
        )
        "#
    );

    sqlx::query(&ddl).execute(pool).await?;

    Ok(())
}

/// Appends one document, the table assigns its id.
pub async fn insert_staged_object(
    pool: &PgPool,
    table: &TableName,
    object_id: &str,
    update_ts: NaiveDateTime,
    object_value: &Value,
) -> sqlx::Result<i64> {
    let table = table.as_quoted_identifier();
    let statement = format!(
        r#"
        insert into {table} (object_id, object_value, update_ts)
        values ($1, $2, $3)
        returning id
        "#
    );

    sqlx::query_scalar(&statement)
        .bind(object_id)
        .bind(Json(object_value))
        .bind(update_ts)
        .fetch_one(pool)
        .await
}

/// Returns every staged document with an id greater than `since_id`, in id order.
pub async fn get_staged_objects_since(
    pool: &PgPool,
    table: &TableName,
    since_id: i64,
) -> sqlx::Result<Vec<StagedObjectRow>> {
    let table = table.as_quoted_identifier();
    let statement = format!(
        r#"
        select id, object_id, object_value, update_ts
        from {table}
        where id > $1
        order by id asc
        "#
    );

    sqlx::query_as::<_, StagedObjectRow>(&statement)
        .bind(since_id)
        .fetch_all(pool)
        .await
}
