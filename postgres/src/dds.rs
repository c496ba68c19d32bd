//! Queries against the dimensional model in the `dds` schema.
//!
//! Dimension inserts resolve conflicts on the natural key as chosen by the
//! caller through [`OnConflict`]. The fact table is keyed by the order
//! surrogate id and always overwrites.

use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};

/// What a dimension insert does when the natural key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Keep the stored row.
    DoNothing,
    /// Overwrite the stored attributes, the surrogate id stays.
    DoUpdate,
}

#[derive(Debug, Clone, FromRow)]
pub struct CourierRow {
    pub id: i64,
    pub courier_id: String,
    pub courier_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRow {
    pub id: i64,
    pub delivery_id: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_key: String,
    pub order_status: String,
}

/// A row of `dds.fct_deliveries`, every reference already resolved to a surrogate id.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FctDeliveryRow {
    pub order_id: i64,
    pub delivery_id: i64,
    pub courier_id: i64,
    pub order_ts: NaiveDateTime,
    pub delivery_ts: NaiveDateTime,
    pub address: String,
    pub rate: i32,
    pub tip_sum: f64,
    pub total_sum: f64,
}

pub async fn upsert_courier(
    pool: &PgPool,
    courier_id: &str,
    courier_name: &str,
    on_conflict: OnConflict,
) -> sqlx::Result<()> {
    let query = match on_conflict {
        OnConflict::DoNothing => {
            r#"
            insert into dds.dm_couriers (courier_id, courier_name)
            values ($1, $2)
            on conflict (courier_id) do nothing
            "#
        }
        OnConflict::DoUpdate => {
            r#"
            insert into dds.dm_couriers (courier_id, courier_name)
            values ($1, $2)
            on conflict (courier_id) do update
            set courier_name = excluded.courier_name
            "#
        }
    };

    sqlx::query(query)
        .bind(courier_id)
        .bind(courier_name)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_courier(pool: &PgPool, courier_id: &str) -> sqlx::Result<Option<CourierRow>> {
    sqlx::query_as::<_, CourierRow>(
        r#"
        select id, courier_id, courier_name
        from dds.dm_couriers
        where courier_id = $1
        "#,
    )
    .bind(courier_id)
    .fetch_optional(pool)
    .await
}

/// Inserts a delivery. The dimension has no attributes besides its natural
/// key, so both conflict behaviours leave an existing row as it is.
pub async fn insert_delivery(
    pool: &PgPool,
    delivery_id: &str,
    on_conflict: OnConflict,
) -> sqlx::Result<()> {
    let query = match on_conflict {
        OnConflict::DoNothing => {
            r#"
            insert into dds.dm_deliveries (delivery_id)
            values ($1)
            on conflict (delivery_id) do nothing
            "#
        }
        OnConflict::DoUpdate => {
            r#"
            insert into dds.dm_deliveries (delivery_id)
            values ($1)
            on conflict (delivery_id) do update
            set delivery_id = excluded.delivery_id
            "#
        }
    };

    sqlx::query(query).bind(delivery_id).execute(pool).await?;

    Ok(())
}

pub async fn get_delivery(
    pool: &PgPool,
    delivery_id: &str,
) -> sqlx::Result<Option<DeliveryRow>> {
    sqlx::query_as::<_, DeliveryRow>(
        r#"
        select id, delivery_id
        from dds.dm_deliveries
        where delivery_id = $1
        "#,
    )
    .bind(delivery_id)
    .fetch_optional(pool)
    .await
}

pub async fn upsert_order(
    pool: &PgPool,
    order_key: &str,
    order_status: &str,
    on_conflict: OnConflict,
) -> sqlx::Result<()> {
    let query = match on_conflict {
        OnConflict::DoNothing => {
            r#"
            insert into dds.dm_orders (order_key, order_status)
            values ($1, $2)
            on conflict (order_key) do nothing
            "#
        }
        OnConflict::DoUpdate => {
            r#"
            insert into dds.dm_orders (order_key, order_status)
            values ($1, $2)
            on conflict (order_key) do update
            set order_status = excluded.order_status
            "#
        }
    };

    sqlx::query(query)
        .bind(order_key)
        .bind(order_status)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_order(pool: &PgPool, order_key: &str) -> sqlx::Result<Option<OrderRow>> {
    sqlx::query_as::<_, OrderRow>(
        r#"
        select id, order_key, order_status
        from dds.dm_orders
        where order_key = $1
        "#,
    )
    .bind(order_key)
    .fetch_optional(pool)
    .await
}

/// Writes a delivery fact, replacing every measure of an existing fact for the same order.
pub async fn upsert_fct_delivery(pool: &PgPool, fact: &FctDeliveryRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        insert into dds.fct_deliveries (
            order_id,
            delivery_id,
            courier_id,
            order_ts,
            delivery_ts,
            address,
            rate,
            tip_sum,
            total_sum
        )
        values ($1, $2, $3, $4, $5, $6, $7, $8::numeric(14, 2), $9::numeric(14, 2))
        on conflict (order_id) do update
        set
            delivery_id = excluded.delivery_id,
            courier_id = excluded.courier_id,
            order_ts = excluded.order_ts,
            delivery_ts = excluded.delivery_ts,
            address = excluded.address,
            rate = excluded.rate,
            tip_sum = excluded.tip_sum,
            total_sum = excluded.total_sum
        "#,
    )
    .bind(fact.order_id)
    .bind(fact.delivery_id)
    .bind(fact.courier_id)
    .bind(fact.order_ts)
    .bind(fact.delivery_ts)
    .bind(&fact.address)
    .bind(fact.rate)
    .bind(fact.tip_sum)
    .bind(fact.total_sum)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_fct_delivery(
    pool: &PgPool,
    order_id: i64,
) -> sqlx::Result<Option<FctDeliveryRow>> {
    sqlx::query_as::<_, FctDeliveryRow>(
        r#"
        select
            order_id,
            delivery_id,
            courier_id,
            order_ts,
            delivery_ts,
            address,
            rate,
            tip_sum::float8 as tip_sum,
            total_sum::float8 as total_sum
        from dds.fct_deliveries
        where order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
}
