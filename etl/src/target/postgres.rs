use postgres::dds::{
    CourierRow, DeliveryRow, FctDeliveryRow, OnConflict, OrderRow, get_courier, get_delivery,
    get_fct_delivery, get_order, insert_delivery, upsert_courier, upsert_fct_delivery,
    upsert_order,
};
use postgres::schema::ensure_schema;
use postgres::staging::create_staging_table;
use postgres::types::TableName;
use sqlx::PgPool;

use crate::entities::{Courier, Delivery, DeliveryFact, Order, STAGING_TABLES};
use crate::error::EtlResult;
use crate::target::{ConflictPolicy, Dimension, DimensionRepository, DimensionRow, FactRepository};

/// The warehouse database: dimension and fact repositories plus schema setup.
///
/// Cloning is cheap, clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    pool: PgPool,
    staging_schema: String,
}

impl PostgresWarehouse {
    pub fn new(pool: PgPool, staging_schema: impl Into<String>) -> Self {
        Self {
            pool,
            staging_schema: staging_schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the staging schema, every staging table read by a loader and the
    /// dimensional model. Safe to call before every run.
    pub async fn ensure_schema(&self) -> EtlResult<()> {
        ensure_schema(&self.pool, &self.staging_schema).await?;

        for table in STAGING_TABLES {
            create_staging_table(&self.pool, &TableName::new(&self.staging_schema, *table))
                .await?;
        }

        Ok(())
    }
}

/// Conflict clause of the dimension insert for `E`.
fn on_conflict<E: Dimension>() -> OnConflict {
    match E::CONFLICT_POLICY {
        ConflictPolicy::Ignore => OnConflict::DoNothing,
        ConflictPolicy::Update => OnConflict::DoUpdate,
    }
}

impl DimensionRepository<Courier> for PostgresWarehouse {
    async fn upsert(&self, entity: &Courier) -> EtlResult<()> {
        upsert_courier(
            &self.pool,
            &entity.courier_id,
            &entity.courier_name,
            on_conflict::<Courier>(),
        )
        .await?;

        Ok(())
    }

    async fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> EtlResult<Option<DimensionRow<Courier>>> {
        let row = get_courier(&self.pool, natural_key).await?;

        Ok(row.map(
            |CourierRow {
                 id,
                 courier_id,
                 courier_name,
             }| DimensionRow {
                surrogate_id: id,
                entity: Courier {
                    courier_id,
                    courier_name,
                },
            },
        ))
    }
}

impl DimensionRepository<Delivery> for PostgresWarehouse {
    async fn upsert(&self, entity: &Delivery) -> EtlResult<()> {
        insert_delivery(&self.pool, &entity.delivery_id, on_conflict::<Delivery>()).await?;

        Ok(())
    }

    async fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> EtlResult<Option<DimensionRow<Delivery>>> {
        let row = get_delivery(&self.pool, natural_key).await?;

        Ok(row.map(|DeliveryRow { id, delivery_id }| DimensionRow {
            surrogate_id: id,
            entity: Delivery { delivery_id },
        }))
    }
}

impl DimensionRepository<Order> for PostgresWarehouse {
    async fn upsert(&self, entity: &Order) -> EtlResult<()> {
        upsert_order(
            &self.pool,
            &entity.order_key,
            &entity.order_status,
            on_conflict::<Order>(),
        )
        .await?;

        Ok(())
    }

    async fn get_by_natural_key(
        &self,
        natural_key: &str,
    ) -> EtlResult<Option<DimensionRow<Order>>> {
        let row = get_order(&self.pool, natural_key).await?;

        Ok(row.map(
            |OrderRow {
                 id,
                 order_key,
                 order_status,
             }| DimensionRow {
                surrogate_id: id,
                entity: Order {
                    order_key,
                    order_status,
                },
            },
        ))
    }
}

impl FactRepository<DeliveryFact> for PostgresWarehouse {
    async fn upsert(&self, fact: &DeliveryFact) -> EtlResult<()> {
        let row = FctDeliveryRow {
            order_id: fact.order_id,
            delivery_id: fact.delivery_id,
            courier_id: fact.courier_id,
            order_ts: fact.order_ts,
            delivery_ts: fact.delivery_ts,
            address: fact.address.clone(),
            rate: fact.rate,
            tip_sum: fact.tip_sum,
            total_sum: fact.total_sum,
        };
        upsert_fct_delivery(&self.pool, &row).await?;

        Ok(())
    }

    async fn get(&self, key: i64) -> EtlResult<Option<DeliveryFact>> {
        let row = get_fct_delivery(&self.pool, key).await?;

        Ok(row.map(|row| DeliveryFact {
            order_id: row.order_id,
            delivery_id: row.delivery_id,
            courier_id: row.courier_id,
            order_ts: row.order_ts,
            delivery_ts: row.delivery_ts,
            address: row.address,
            rate: row.rate,
            tip_sum: row.tip_sum,
            total_sum: row.total_sum,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_clauses_follow_dimension_policies() {
        assert_eq!(on_conflict::<Courier>(), OnConflict::DoUpdate);
        assert_eq!(on_conflict::<Delivery>(), OnConflict::DoNothing);
        assert_eq!(on_conflict::<Order>(), OnConflict::DoUpdate);
    }
}
