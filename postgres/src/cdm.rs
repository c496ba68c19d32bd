//! Queries against the reporting datamarts in the `cdm` schema.

use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};

/// A delivery fact joined with the courier that made it.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CourierDeliveryRow {
    pub courier_id: String,
    pub courier_name: String,
    pub order_ts: NaiveDateTime,
    pub rate: i32,
    pub total_sum: f64,
    pub tip_sum: f64,
}

/// A row of `cdm.dm_courier_ledger`: what one courier earned in one month.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CourierLedgerRow {
    pub courier_id: String,
    pub courier_name: String,
    pub settlement_year: i32,
    pub settlement_month: i32,
    pub orders_count: i32,
    pub orders_total_sum: f64,
    pub rate_avg: f64,
    pub order_processing_fee: f64,
    pub courier_order_sum: f64,
    pub courier_tips_sum: f64,
    pub courier_reward_sum: f64,
}

pub async fn get_courier_deliveries(pool: &PgPool) -> sqlx::Result<Vec<CourierDeliveryRow>> {
    sqlx::query_as::<_, CourierDeliveryRow>(
        r#"
        select
            c.courier_id,
            c.courier_name,
            f.order_ts,
            f.rate,
            f.total_sum::float8 as total_sum,
            f.tip_sum::float8 as tip_sum
        from dds.fct_deliveries f
        join dds.dm_couriers c on c.id = f.courier_id
        order by f.order_id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Replaces the whole ledger with `rows` in one transaction.
pub async fn replace_courier_ledger(pool: &PgPool, rows: &[CourierLedgerRow]) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("delete from cdm.dm_courier_ledger")
        .execute(&mut *tx)
        .await?;

    for row in rows {
        sqlx::query(
            r#"
            insert into cdm.dm_courier_ledger (
                courier_id,
                courier_name,
                settlement_year,
                settlement_month,
                orders_count,
                orders_total_sum,
                rate_avg,
                order_processing_fee,
                courier_order_sum,
                courier_tips_sum,
                courier_reward_sum
            )
            values (
                $1, $2, $3, $4, $5,
                $6::numeric(19, 5),
                $7::numeric(19, 5),
                $8::numeric(19, 5),
                $9::numeric(19, 5),
                $10::numeric(19, 5),
                $11::numeric(19, 5)
            )
            "#,
        )
        .bind(&row.courier_id)
        .bind(&row.courier_name)
        .bind(row.settlement_year)
        .bind(row.settlement_month)
        .bind(row.orders_count)
        .bind(row.orders_total_sum)
        .bind(row.rate_avg)
        .bind(row.order_processing_fee)
        .bind(row.courier_order_sum)
        .bind(row.courier_tips_sum)
        .bind(row.courier_reward_sum)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn get_courier_ledger(pool: &PgPool) -> sqlx::Result<Vec<CourierLedgerRow>> {
    sqlx::query_as::<_, CourierLedgerRow>(
        r#"
        select
            courier_id,
            courier_name,
            settlement_year,
            settlement_month,
            orders_count,
            orders_total_sum::float8 as orders_total_sum,
            rate_avg::float8 as rate_avg,
            order_processing_fee::float8 as order_processing_fee,
            courier_order_sum::float8 as courier_order_sum,
            courier_tips_sum::float8 as courier_tips_sum,
            courier_reward_sum::float8 as courier_reward_sum
        from cdm.dm_courier_ledger
        order by courier_id, settlement_year, settlement_month
        "#,
    )
    .fetch_all(pool)
    .await
}
