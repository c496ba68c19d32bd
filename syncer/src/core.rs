use anyhow::Context;
use config::shared::SyncConfig;
use etl::entities::{
    Courier, Delivery, DeliveryFactResolver, Order, STAGING_SOURCES, couriers_stream,
    deliveries_stream, delivery_facts_stream, orders_stream,
};
use etl::ledger::CourierLedgerRefresher;
use etl::loaders::{DimensionLoader, FactLoader, LoadReport};
use etl::staging::PostgresStaging;
use etl::staging::copier::{CopyRequest, StagingCopier};
use etl::staging::http::HttpUpstreamProvider;
use etl::staging::upstream::TimeWindow;
use etl::store::watermark::PostgresWatermarkStore;
use etl::target::PostgresWarehouse;
use etl::types::{Stream, TableName};
use postgres::pool::connect_to_warehouse;
use tracing::{info, warn};

use crate::cli::{Job, Source, StreamName};

/// Runs one job against the configured warehouse.
pub async fn run_job(config: SyncConfig, job: Job) -> anyhow::Result<()> {
    let pool = connect_to_warehouse(&config.warehouse)
        .await
        .context("failed to connect to the warehouse")?;
    let warehouse = PostgresWarehouse::new(pool.clone(), config.staging.schema.clone());

    match job {
        Job::Schema => {
            warehouse.ensure_schema().await?;
        }
        Job::Stage { source } => {
            stage(&config, PostgresStaging::new(pool.clone()), source).await?;
        }
        Job::Load { stream } => {
            let schema = &config.staging.schema;
            let watermarks = PostgresWatermarkStore::new(pool.clone());
            let staging = PostgresStaging::new(pool.clone());

            let (stream, report) = match stream {
                StreamName::Couriers => {
                    let stream = couriers_stream(schema);
                    let loader =
                        DimensionLoader::<Courier, _, _, _>::new(watermarks, staging, warehouse);
                    let report = loader.load(&stream).await?;
                    (stream, report)
                }
                StreamName::Deliveries => {
                    let stream = deliveries_stream(schema);
                    let loader =
                        DimensionLoader::<Delivery, _, _, _>::new(watermarks, staging, warehouse);
                    let report = loader.load(&stream).await?;
                    (stream, report)
                }
                StreamName::Orders => {
                    let stream = orders_stream(schema);
                    let loader =
                        DimensionLoader::<Order, _, _, _>::new(watermarks, staging, warehouse);
                    let report = loader.load(&stream).await?;
                    (stream, report)
                }
                StreamName::DeliveryFacts => {
                    let stream = delivery_facts_stream(schema);
                    let resolver = DeliveryFactResolver::new(
                        warehouse.clone(),
                        warehouse.clone(),
                        warehouse.clone(),
                    );
                    let loader = FactLoader::new(watermarks, staging, resolver, warehouse);
                    let report = loader.load(&stream).await?;
                    (stream, report)
                }
            };

            log_report(&stream, &report)?;
        }
        Job::Ledger => {
            let entries = CourierLedgerRefresher::new(warehouse).refresh().await?;
            info!(entries, "courier ledger rebuilt");
        }
    }

    pool.close().await;

    Ok(())
}

async fn stage(
    config: &SyncConfig,
    staging: PostgresStaging,
    source: Source,
) -> anyhow::Result<()> {
    let collection = source.collection();
    let staging_source = STAGING_SOURCES
        .iter()
        .find(|staging_source| staging_source.collection == collection)
        .with_context(|| format!("`{collection}` is not a staged collection"))?;

    let upstream = HttpUpstreamProvider::new(&config.upstream)?;
    let copier = StagingCopier::new(upstream, staging);
    let request = CopyRequest {
        collection: collection.to_owned(),
        sort_field: staging_source.sort_field.to_owned(),
        sort_direction: staging_source.sort_direction,
        window: TimeWindow::trailing_days(config.upstream.window_days),
        page_size: config.upstream.page_size,
        target: TableName::new(config.staging.schema.clone(), staging_source.table),
    };

    let staged = copier.copy(&request).await?;
    info!(collection, staged, target = %request.target, "collection staged");

    Ok(())
}

fn log_report(stream: &Stream, report: &LoadReport) -> anyhow::Result<()> {
    let last_loaded_id = report.watermark.last_loaded_id()?;

    match &report.halted {
        None => info!(
            workflow_key = %stream.workflow_key,
            fetched = report.fetched,
            applied = report.applied,
            last_loaded_id,
            "stream loaded"
        ),
        Some(halted) => warn!(
            workflow_key = %stream.workflow_key,
            fetched = report.fetched,
            applied = report.applied,
            last_loaded_id,
            halted_at = halted.record_id,
            missing = %halted.missing,
            "stream halted, the remaining records wait for their dimensions"
        ),
    }

    Ok(())
}
