use chrono::NaiveDateTime;

use crate::entities::{Courier, Delivery, Order};
use crate::error::{ErrorKind, EtlResult};
use crate::{bail, etl_error};
use crate::loaders::{FactResolver, MissingDependency, Resolution};
use crate::target::{Dimension, DimensionRepository, Fact};
use crate::types::StagedRecord;

/// Format of `order_ts` and `delivery_ts`, the fraction is optional.
const DELIVERY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One delivered order. References are surrogate ids of the dimension rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryFact {
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

impl Fact for DeliveryFact {
    const NAME: &'static str = "delivery";

    fn key(&self) -> i64 {
        self.order_id
    }
}

/// Resolves staged deliveries against the delivery, order and courier dimensions.
#[derive(Debug, Clone)]
pub struct DeliveryFactResolver<D, O, C> {
    deliveries: D,
    orders: O,
    couriers: C,
}

impl<D, O, C> DeliveryFactResolver<D, O, C> {
    pub fn new(deliveries: D, orders: O, couriers: C) -> Self {
        Self {
            deliveries,
            orders,
            couriers,
        }
    }
}

impl<D, O, C> FactResolver for DeliveryFactResolver<D, O, C>
where
    D: DimensionRepository<Delivery> + Sync,
    O: DimensionRepository<Order> + Sync,
    C: DimensionRepository<Courier> + Sync,
{
    type Fact = DeliveryFact;

    async fn resolve(&self, record: &StagedRecord) -> EtlResult<Resolution<DeliveryFact>> {
        let delivery_key = record.str_field("delivery_id")?;
        let Some(delivery) = self.deliveries.get_by_natural_key(delivery_key).await? else {
            return Ok(missing::<Delivery>(delivery_key));
        };

        let order_key = record.str_field("order_id")?;
        let Some(order) = self.orders.get_by_natural_key(order_key).await? else {
            return Ok(missing::<Order>(order_key));
        };

        let courier_key = record.str_field("courier_id")?;
        let Some(courier) = self.couriers.get_by_natural_key(courier_key).await? else {
            return Ok(missing::<Courier>(courier_key));
        };

        Ok(Resolution::Resolved(DeliveryFact {
            order_id: order.surrogate_id,
            delivery_id: delivery.surrogate_id,
            courier_id: courier.surrogate_id,
            order_ts: timestamp_field(record, "order_ts")?,
            delivery_ts: timestamp_field(record, "delivery_ts")?,
            address: record.str_field("address")?.to_owned(),
            rate: rate_field(record)?,
            tip_sum: record.f64_field("tip_sum")?,
            total_sum: record.f64_field("sum")?,
        }))
    }
}

fn missing<E: Dimension>(natural_key: &str) -> Resolution<DeliveryFact> {
    Resolution::Missing(MissingDependency {
        entity: E::NAME,
        natural_key: natural_key.to_owned(),
    })
}

/// Reads `rate`, accepting any JSON number holding a whole value in `i32` range.
fn rate_field(record: &StagedRecord) -> EtlResult<i32> {
    let rate = record.f64_field("rate")?;

    let whole = rate.is_finite() && rate.fract() == 0.0;
    if !whole || rate < f64::from(i32::MIN) || rate > f64::from(i32::MAX) {
        bail!(
            ErrorKind::InvalidPayload,
            "Staged payload has a mistyped field",
            format!(
                "record {} has `rate` = {rate}, expected a whole number",
                record.id
            )
        );
    }

    Ok(rate as i32)
}

fn timestamp_field(record: &StagedRecord, name: &str) -> EtlResult<NaiveDateTime> {
    let value = record.str_field(name)?;

    NaiveDateTime::parse_from_str(value, DELIVERY_TIMESTAMP_FORMAT).map_err(|err| {
        etl_error!(
            ErrorKind::InvalidPayload,
            "Staged payload has a malformed timestamp",
            format!("record {} has `{name}` = {value:?}", record.id),
            source: err
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::target::MemoryDimensionRepository;

    struct Dimensions {
        deliveries: MemoryDimensionRepository<Delivery>,
        orders: MemoryDimensionRepository<Order>,
        couriers: MemoryDimensionRepository<Courier>,
    }

    impl Dimensions {
        async fn with_all() -> Self {
            let dimensions = Dimensions {
                deliveries: MemoryDimensionRepository::new(),
                orders: MemoryDimensionRepository::new(),
                couriers: MemoryDimensionRepository::new(),
            };
            dimensions
                .deliveries
                .upsert(&Delivery {
                    delivery_id: "d1".to_owned(),
                })
                .await
                .unwrap();
            dimensions
                .orders
                .upsert(&Order {
                    order_key: "o1".to_owned(),
                    order_status: "CLOSED".to_owned(),
                })
                .await
                .unwrap();

            dimensions
        }

        fn resolver(
            &self,
        ) -> DeliveryFactResolver<
            MemoryDimensionRepository<Delivery>,
            MemoryDimensionRepository<Order>,
            MemoryDimensionRepository<Courier>,
        > {
            DeliveryFactResolver::new(
                self.deliveries.clone(),
                self.orders.clone(),
                self.couriers.clone(),
            )
        }
    }

    fn record(payload: Value) -> StagedRecord {
        StagedRecord {
            id: 7,
            natural_key: "d1".to_owned(),
            payload,
            loaded_at: NaiveDateTime::default(),
        }
    }

    fn payload() -> Value {
        json!({
            "order_id": "o1",
            "order_ts": "2022-09-13 22:47:37.826000",
            "delivery_id": "d1",
            "courier_id": "c1",
            "address": "Ул. Заречная, 2, кв. 118",
            "delivery_ts": "2022-09-13 23:31:42",
            "rate": 5,
            "sum": 1200,
            "tip_sum": 60.5
        })
    }

    #[tokio::test]
    async fn missing_courier_is_reported_not_raised() {
        let dimensions = Dimensions::with_all().await;

        let resolution = dimensions.resolver().resolve(&record(payload())).await.unwrap();

        assert_eq!(
            resolution,
            Resolution::Missing(MissingDependency {
                entity: "courier",
                natural_key: "c1".to_owned(),
            })
        );
    }

    #[tokio::test]
    async fn resolves_surrogates_and_measures() {
        let dimensions = Dimensions::with_all().await;
        dimensions
            .couriers
            .upsert(&Courier {
                courier_id: "c1".to_owned(),
                courier_name: "Eva".to_owned(),
            })
            .await
            .unwrap();

        let Resolution::Resolved(fact) =
            dimensions.resolver().resolve(&record(payload())).await.unwrap()
        else {
            panic!("expected a resolved fact");
        };

        assert_eq!(fact.order_id, 1);
        assert_eq!(fact.courier_id, 1);
        assert_eq!(fact.rate, 5);
        assert_eq!(fact.total_sum, 1200.0);
        assert_eq!(fact.tip_sum, 60.5);
        assert_eq!(
            fact.order_ts.format("%H:%M:%S%.3f").to_string(),
            "22:47:37.826"
        );
        assert_eq!(fact.delivery_ts.format("%H:%M:%S").to_string(), "23:31:42");
    }

    async fn resolve_rate(rate: Value) -> EtlResult<Resolution<DeliveryFact>> {
        let dimensions = Dimensions::with_all().await;
        dimensions
            .couriers
            .upsert(&Courier {
                courier_id: "c1".to_owned(),
                courier_name: "Eva".to_owned(),
            })
            .await
            .unwrap();
        let mut payload = payload();
        payload["rate"] = rate;

        dimensions.resolver().resolve(&record(payload)).await
    }

    #[tokio::test]
    async fn whole_float_rates_are_accepted() {
        let Resolution::Resolved(fact) = resolve_rate(json!(5.0)).await.unwrap() else {
            panic!("expected a resolved fact");
        };

        assert_eq!(fact.rate, 5);
    }

    #[tokio::test]
    async fn fractional_and_out_of_range_rates_are_invalid_payloads() {
        for rate in [json!(4.5), json!(1e12), json!("5")] {
            let err = resolve_rate(rate).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPayload);
        }
    }

    #[tokio::test]
    async fn malformed_timestamps_are_invalid_payloads() {
        let dimensions = Dimensions::with_all().await;
        dimensions
            .couriers
            .upsert(&Courier {
                courier_id: "c1".to_owned(),
                courier_name: "Eva".to_owned(),
            })
            .await
            .unwrap();
        let mut payload = payload();
        payload["order_ts"] = json!("13.09.2022");

        let err = dimensions.resolver().resolve(&record(payload)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
        assert!(err.detail().unwrap().contains("order_ts"));
    }
}
