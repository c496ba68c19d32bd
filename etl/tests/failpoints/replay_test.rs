use etl::entities::{Courier, couriers_stream};
use etl::error::ErrorKind;
use etl::failpoints::{APPLY_RECORD__BEFORE_WATERMARK_SAVE, STAGING_COPY__BEFORE_WRITE};
use etl::loaders::DimensionLoader;
use etl::staging::MemoryStaging;
use etl::staging::copier::{CopyRequest, StagingCopier};
use etl::staging::upstream::{SortDirection, TimeWindow};
use etl::store::watermark::{MemoryWatermarkStore, WatermarkStore};
use etl::target::MemoryDimensionRepository;
use etl::test_utils::failpoints::FailPointsScenario;
use etl::test_utils::fixtures::{courier_payload, stage};
use etl::test_utils::upstream::MemoryUpstream;
use telemetry::init_test_tracing;

#[tokio::test]
async fn crash_before_checkpoint_replays_the_record() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let watermarks = MemoryWatermarkStore::new();
    let couriers = MemoryDimensionRepository::<Courier>::new();
    let stream = couriers_stream("stg");
    stage(
        &staging,
        &stream.source,
        "_id",
        &[
            courier_payload("A", "Eva"),
            courier_payload("B", "Ivan"),
            courier_payload("C", "Olga"),
        ],
    )
    .await;
    let loader = DimensionLoader::new(watermarks.clone(), staging.clone(), couriers.clone());

    // The second record is written but its checkpoint is lost.
    let scenario =
        FailPointsScenario::setup(&[(APPLY_RECORD__BEFORE_WATERMARK_SAVE, "1*off->return")]);
    let err = loader.load(&stream).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InjectedFault);

    let state = watermarks.get(&stream.workflow_key).await.unwrap().unwrap();
    assert_eq!(state.last_loaded_id().unwrap(), 1);
    assert_eq!(couriers.rows().await.len(), 2);

    scenario.disable();
    let report = loader.load(&stream).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.watermark.last_loaded_id().unwrap(), 3);
    let names: Vec<_> = couriers
        .rows()
        .await
        .into_iter()
        .map(|row| row.entity.courier_name)
        .collect();
    assert_eq!(names, ["Eva", "Ivan", "Olga"]);
}

#[tokio::test]
async fn crash_before_staging_writes_leaves_staging_untouched() {
    init_test_tracing();

    let staging = MemoryStaging::new();
    let request = CopyRequest {
        collection: "couriers".to_owned(),
        sort_field: "_id".to_owned(),
        sort_direction: SortDirection::Asc,
        window: TimeWindow::trailing_days(7),
        page_size: 5,
        target: couriers_stream("stg").source,
    };
    let copier = StagingCopier::new(MemoryUpstream::with_page_sizes(&[5, 2]), staging.clone());

    let scenario = FailPointsScenario::setup(&[(STAGING_COPY__BEFORE_WRITE, "return")]);
    let err = copier.copy(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InjectedFault);
    assert!(staging.records(&request.target).await.is_empty());

    scenario.disable();
    let copier = StagingCopier::new(MemoryUpstream::with_page_sizes(&[5, 2]), staging.clone());
    assert_eq!(copier.copy(&request).await.unwrap(), 7);
    assert_eq!(staging.records(&request.target).await.len(), 7);
}
