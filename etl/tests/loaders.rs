use etl::entities::{
    Courier, Delivery, DeliveryFact, DeliveryFactResolver, Order, couriers_stream,
    deliveries_stream, delivery_facts_stream, orders_stream,
};
use etl::loaders::{DimensionLoader, FactLoader, LoadReport, MissingDependency};
use etl::staging::MemoryStaging;
use etl::store::watermark::{MemoryWatermarkStore, WatermarkStore};
use etl::target::{DimensionRepository, MemoryDimensionRepository, MemoryFactRepository};
use etl::test_utils::fixtures::{courier_payload, delivery_payload, order_payload, stage};
use etl::types::{Stream, WatermarkState};
use serde_json::Value;
use telemetry::init_test_tracing;

const STAGING_SCHEMA: &str = "stg";

type CourierLoader = DimensionLoader<
    Courier,
    MemoryWatermarkStore,
    MemoryStaging,
    MemoryDimensionRepository<Courier>,
>;

fn courier_loader(
    watermarks: &MemoryWatermarkStore,
    staging: &MemoryStaging,
    couriers: &MemoryDimensionRepository<Courier>,
) -> CourierLoader {
    DimensionLoader::new(watermarks.clone(), staging.clone(), couriers.clone())
}

/// Every dimension repository and the fact repository of the delivery model.
#[derive(Clone, Default)]
struct Warehouse {
    couriers: MemoryDimensionRepository<Courier>,
    deliveries: MemoryDimensionRepository<Delivery>,
    orders: MemoryDimensionRepository<Order>,
    facts: MemoryFactRepository<DeliveryFact>,
}

impl Warehouse {
    async fn load_dimensions(&self, watermarks: &MemoryWatermarkStore, staging: &MemoryStaging) {
        courier_loader(watermarks, staging, &self.couriers)
            .load(&couriers_stream(STAGING_SCHEMA))
            .await
            .unwrap();
        DimensionLoader::<Delivery, _, _, _>::new(
            watermarks.clone(),
            staging.clone(),
            self.deliveries.clone(),
        )
        .load(&deliveries_stream(STAGING_SCHEMA))
        .await
        .unwrap();
        DimensionLoader::<Order, _, _, _>::new(
            watermarks.clone(),
            staging.clone(),
            self.orders.clone(),
        )
        .load(&orders_stream(STAGING_SCHEMA))
        .await
        .unwrap();
    }

    async fn load_facts(
        &self,
        watermarks: &MemoryWatermarkStore,
        staging: &MemoryStaging,
    ) -> LoadReport {
        let resolver = DeliveryFactResolver::new(
            self.deliveries.clone(),
            self.orders.clone(),
            self.couriers.clone(),
        );

        FactLoader::new(watermarks.clone(), staging.clone(), resolver, self.facts.clone())
            .load(&delivery_facts_stream(STAGING_SCHEMA))
            .await
            .unwrap()
    }
}

async fn stage_couriers(staging: &MemoryStaging, payloads: &[Value]) -> Vec<i64> {
    stage(staging, &couriers_stream(STAGING_SCHEMA).source, "_id", payloads).await
}

async fn saved_watermark(watermarks: &MemoryWatermarkStore, stream: &Stream) -> Option<i64> {
    watermarks
        .get(&stream.workflow_key)
        .await
        .unwrap()
        .map(|state| state.last_loaded_id().unwrap())
}

#[tokio::test]
async fn first_run_loads_every_staged_dimension() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let couriers = MemoryDimensionRepository::new();
    stage_couriers(
        &staging,
        &[courier_payload("A", "Eva"), courier_payload("B", "Ivan")],
    )
    .await;

    let stream = couriers_stream(STAGING_SCHEMA);
    let report = courier_loader(&watermarks, &staging, &couriers)
        .load(&stream)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.watermark.last_loaded_id().unwrap(), 2);
    assert_eq!(saved_watermark(&watermarks, &stream).await, Some(2));

    let keys: Vec<_> = couriers
        .rows()
        .await
        .into_iter()
        .map(|row| row.entity.courier_id)
        .collect();
    assert_eq!(keys, ["A", "B"]);
}

#[tokio::test]
async fn rerunning_without_new_records_changes_nothing() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let couriers = MemoryDimensionRepository::new();
    stage_couriers(
        &staging,
        &[courier_payload("A", "Eva"), courier_payload("B", "Ivan")],
    )
    .await;
    let stream = couriers_stream(STAGING_SCHEMA);
    let loader = courier_loader(&watermarks, &staging, &couriers);

    loader.load(&stream).await.unwrap();
    let rows = couriers.rows().await;
    let saves = watermarks.history(&stream.workflow_key).await.len();

    let report = loader.load(&stream).await.unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.applied, 0);
    assert_eq!(couriers.rows().await, rows);
    assert_eq!(watermarks.history(&stream.workflow_key).await.len(), saves);
}

#[tokio::test]
async fn interrupted_runs_converge_to_the_uninterrupted_result() {
    init_test_tracing();

    let payloads = [
        courier_payload("A", "Eva"),
        courier_payload("B", "Ivan"),
        courier_payload("A", "Eva Petrova"),
        courier_payload("C", "Olga"),
        courier_payload("B", "Ivan Sidorov"),
    ];
    let stream = couriers_stream(STAGING_SCHEMA);

    let expected = {
        let staging = MemoryStaging::new();
        let couriers = MemoryDimensionRepository::new();
        stage_couriers(&staging, &payloads).await;
        courier_loader(&MemoryWatermarkStore::new(), &staging, &couriers)
            .load(&stream)
            .await
            .unwrap();
        couriers.rows().await
    };

    for stop_after in 0..=payloads.len() {
        let staging = MemoryStaging::new();
        let watermarks = MemoryWatermarkStore::new();
        let couriers = MemoryDimensionRepository::new();

        // First run only sees the records staged before the interruption.
        let ids = stage_couriers(&staging, &payloads[..stop_after]).await;
        courier_loader(&watermarks, &staging, &couriers)
            .load(&stream)
            .await
            .unwrap();

        // Crash after the last write but before its checkpoint: the record is replayed.
        if stop_after > 0 {
            let mut state = WatermarkState::initial(stream.workflow_key.clone());
            if stop_after > 1 {
                state.advance(ids[stop_after - 2]).unwrap();
            }
            watermarks.seed(state).await;
        }

        stage_couriers(&staging, &payloads[stop_after..]).await;
        courier_loader(&watermarks, &staging, &couriers)
            .load(&stream)
            .await
            .unwrap();

        assert_eq!(couriers.rows().await, expected, "stopped after {stop_after}");
    }
}

#[tokio::test]
async fn watermark_never_moves_backwards() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let couriers = MemoryDimensionRepository::new();
    let stream = couriers_stream(STAGING_SCHEMA);
    let loader = courier_loader(&watermarks, &staging, &couriers);

    let mut previous = -1;
    for batch in [vec!["A", "B"], vec![], vec!["C"], vec!["A", "D", "E"]] {
        let payloads: Vec<_> = batch.iter().map(|key| courier_payload(key, key)).collect();
        stage_couriers(&staging, &payloads).await;

        let report = loader.load(&stream).await.unwrap();

        let current = report.watermark.last_loaded_id().unwrap();
        assert!(current >= previous);
        previous = current;
    }

    let history: Vec<_> = watermarks
        .history(&stream.workflow_key)
        .await
        .iter()
        .map(|state| state.last_loaded_id().unwrap())
        .collect();
    assert!(history.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(previous, 6);
}

#[tokio::test]
async fn natural_keys_never_duplicate_dimension_rows() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let warehouse = Warehouse::default();
    stage_couriers(
        &staging,
        &[courier_payload("A", "Eva"), courier_payload("A", "Eva Petrova")],
    )
    .await;
    let deliveries = deliveries_stream(STAGING_SCHEMA).source;
    stage(
        &staging,
        &deliveries,
        "delivery_id",
        &[
            delivery_payload("d1", "o1", "A"),
            delivery_payload("d1", "o2", "A"),
        ],
    )
    .await;
    stage(&staging, &orders_stream(STAGING_SCHEMA).source, "_id", &[]).await;

    warehouse.load_dimensions(&watermarks, &staging).await;

    // Couriers update on conflict.
    let couriers = warehouse.couriers.rows().await;
    assert_eq!(couriers.len(), 1);
    assert_eq!(couriers[0].entity.courier_name, "Eva Petrova");

    // Deliveries ignore conflicts.
    assert_eq!(warehouse.deliveries.rows().await.len(), 1);
}

#[tokio::test]
async fn facts_wait_for_missing_dimensions() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let warehouse = Warehouse::default();
    stage_couriers(&staging, &[courier_payload("A", "Eva")]).await;
    stage(
        &staging,
        &orders_stream(STAGING_SCHEMA).source,
        "_id",
        &[order_payload("o1", "CLOSED")],
    )
    .await;
    stage(
        &staging,
        &deliveries_stream(STAGING_SCHEMA).source,
        "delivery_id",
        &[delivery_payload("d1", "o1", "D")],
    )
    .await;
    warehouse.load_dimensions(&watermarks, &staging).await;

    let facts_stream = delivery_facts_stream(STAGING_SCHEMA);
    let report = warehouse.load_facts(&watermarks, &staging).await;

    assert_eq!(
        report.halted.map(|halted| halted.missing),
        Some(MissingDependency {
            entity: "courier",
            natural_key: "D".to_owned(),
        })
    );
    assert_eq!(report.watermark.last_loaded_id().unwrap(), -1);
    assert_eq!(saved_watermark(&watermarks, &facts_stream).await, None);
    assert!(warehouse.facts.facts().await.is_empty());

    // The courier arrives, the next fact run picks the halted record up.
    stage_couriers(&staging, &[courier_payload("D", "Olga")]).await;
    warehouse.load_dimensions(&watermarks, &staging).await;
    let report = warehouse.load_facts(&watermarks, &staging).await;

    assert!(report.is_complete());
    let facts = warehouse.facts.facts().await;
    assert_eq!(facts.len(), 1);

    let courier = warehouse.couriers.get_by_natural_key("D").await.unwrap().unwrap();
    let order = warehouse.orders.get_by_natural_key("o1").await.unwrap().unwrap();
    assert_eq!(facts[0].courier_id, courier.surrogate_id);
    assert_eq!(facts[0].order_id, order.surrogate_id);
    assert_eq!(facts[0].total_sum, 3480.0);
    assert_eq!(facts[0].tip_sum, 174.0);
    assert_eq!(facts[0].rate, 4);

    // Replaying the fact stream from scratch keeps one row per order.
    watermarks
        .seed(WatermarkState::initial(facts_stream.workflow_key.clone()))
        .await;
    warehouse.load_facts(&watermarks, &staging).await;
    assert_eq!(warehouse.facts.facts().await, facts);
}

#[tokio::test]
async fn a_halted_fact_blocks_every_later_fact() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let warehouse = Warehouse::default();
    stage_couriers(&staging, &[courier_payload("A", "Eva")]).await;
    stage(
        &staging,
        &orders_stream(STAGING_SCHEMA).source,
        "_id",
        &[order_payload("o1", "CLOSED"), order_payload("o3", "CLOSED")],
    )
    .await;
    let ids = stage(
        &staging,
        &deliveries_stream(STAGING_SCHEMA).source,
        "delivery_id",
        &[
            delivery_payload("d1", "o1", "A"),
            delivery_payload("d2", "o2", "A"),
            delivery_payload("d3", "o3", "A"),
        ],
    )
    .await;
    warehouse.load_dimensions(&watermarks, &staging).await;

    let report = warehouse.load_facts(&watermarks, &staging).await;

    let halted = report.halted.unwrap();
    assert_eq!(halted.record_id, ids[1]);
    assert_eq!(halted.missing.entity, "order");
    assert_eq!(report.applied, 1);
    assert_eq!(report.watermark.last_loaded_id().unwrap(), ids[0]);
    assert_eq!(warehouse.facts.facts().await.len(), 1);
}
