use pg_escape::quote_identifier;
use sqlx::PgPool;
use tracing::info;

/// Schema holding the dimensional model and the workflow settings table.
pub const DDS_SCHEMA: &str = "dds";

/// Schema holding the reporting datamarts built from the dimensional model.
pub const CDM_SCHEMA: &str = "cdm";

/// Tables, indices and constraints of the dimensional model and the datamarts.
///
/// Every statement is guarded with `if not exists` so the whole script can run
/// before every job.
const DDS_DDL: &str = r#"
create schema if not exists dds;

create table if not exists dds.srv_wf_settings (
    id bigint not null primary key generated always as identity,
    workflow_key varchar not null unique,
    workflow_settings jsonb not null
);

create table if not exists dds.dm_couriers (
    id bigint not null primary key generated always as identity,
    courier_id varchar not null unique,
    courier_name varchar not null
);

create table if not exists dds.dm_deliveries (
    id bigint not null primary key generated always as identity,
    delivery_id varchar not null unique
);

create table if not exists dds.dm_orders (
    id bigint not null primary key generated always as identity,
    order_key varchar not null unique,
    order_status varchar not null
);

create table if not exists dds.fct_deliveries (
    order_id bigint not null primary key,
    delivery_id bigint not null,
    courier_id bigint not null,
    order_ts timestamp not null,
    delivery_ts timestamp not null,
    address varchar not null,
    rate integer not null,
    tip_sum numeric(14, 2) not null default 0,
    total_sum numeric(14, 2) not null default 0,
    constraint fct_deliveries_order_id_fkey
        foreign key (order_id) references dds.dm_orders (id),
    constraint fct_deliveries_delivery_id_fkey
        foreign key (delivery_id) references dds.dm_deliveries (id),
    constraint fct_deliveries_courier_id_fkey
        foreign key (courier_id) references dds.dm_couriers (id)
);

create index if not exists idx_fct_deliveries__courier_id on dds.fct_deliveries (courier_id);
create index if not exists idx_fct_deliveries__delivery_id on dds.fct_deliveries (delivery_id);

create schema if not exists cdm;

create table if not exists cdm.dm_courier_ledger (
    id int not null primary key generated always as identity,
    courier_id varchar not null,
    courier_name varchar not null,
    settlement_year int not null check (settlement_year >= 2020 and settlement_year < 2500),
    settlement_month int not null check (settlement_month >= 1 and settlement_month <= 12),
    orders_count int not null default 0 check (orders_count >= 0),
    orders_total_sum numeric(19, 5) not null default 0,
    rate_avg numeric(19, 5),
    order_processing_fee numeric(19, 5) not null default 0,
    courier_order_sum numeric(19, 5) not null default 0,
    courier_tips_sum numeric(19, 5) not null default 0,
    courier_reward_sum numeric(19, 5) not null default 0
);
"#;

/// Creates the staging schema, the dimensional model and the datamarts if they
/// don't exist yet.
///
/// Staging tables themselves are created lazily per collection by
/// [`crate::staging::create_staging_table`].
pub async fn ensure_schema(pool: &PgPool, staging_schema: &str) -> sqlx::Result<()> {
    let staging_ddl = format!(
        "create schema if not exists {};",
        quote_identifier(staging_schema)
    );

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(&staging_ddl).execute(&mut *tx).await?;
    sqlx::raw_sql(DDS_DDL).execute(&mut *tx).await?;
    tx.commit().await?;

    info!(
        staging_schema,
        dds_schema = DDS_SCHEMA,
        cdm_schema = CDM_SCHEMA,
        "warehouse schema ensured"
    );

    Ok(())
}
