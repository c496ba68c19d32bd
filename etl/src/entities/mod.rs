//! Entities of the delivery warehouse and the streams that load them.

mod courier;
mod delivery;
mod delivery_fact;
mod order;

pub use courier::Courier;
pub use delivery::Delivery;
pub use delivery_fact::{DeliveryFact, DeliveryFactResolver};
pub use order::Order;

use crate::staging::upstream::SortDirection;
use crate::types::{Stream, TableName};

/// Staging table of the delivery system `couriers` collection.
pub const COURIERS_STAGING_TABLE: &str = "deliverysystem_couriers";
/// Staging table of the delivery system `deliveries` collection.
pub const DELIVERIES_STAGING_TABLE: &str = "deliverysystem_deliveries";
/// Staging table of the order system `orders` collection.
pub const ORDERS_STAGING_TABLE: &str = "ordersystem_orders";

/// A collection of the delivery system API copied into staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingSource {
    pub collection: &'static str,
    pub sort_field: &'static str,
    pub sort_direction: SortDirection,
    pub table: &'static str,
}

/// Collections copied by the staging job.
pub const STAGING_SOURCES: &[StagingSource] = &[
    StagingSource {
        collection: "couriers",
        sort_field: "_id",
        sort_direction: SortDirection::Asc,
        table: COURIERS_STAGING_TABLE,
    },
    StagingSource {
        collection: "deliveries",
        sort_field: "delivery_id",
        sort_direction: SortDirection::Asc,
        table: DELIVERIES_STAGING_TABLE,
    },
];

/// Every staging table read by a loader, including ones filled outside of this crate.
pub const STAGING_TABLES: &[&str] = &[
    COURIERS_STAGING_TABLE,
    DELIVERIES_STAGING_TABLE,
    ORDERS_STAGING_TABLE,
];

pub fn couriers_stream(staging_schema: &str) -> Stream {
    Stream::new(
        "courier_raw_to_dds_workflow",
        TableName::new(staging_schema, COURIERS_STAGING_TABLE),
    )
}

pub fn deliveries_stream(staging_schema: &str) -> Stream {
    Stream::new(
        "delivery_raw_to_dds_workflow",
        TableName::new(staging_schema, DELIVERIES_STAGING_TABLE),
    )
}

pub fn orders_stream(staging_schema: &str) -> Stream {
    Stream::new(
        "order_raw_to_dds_workflow",
        TableName::new(staging_schema, ORDERS_STAGING_TABLE),
    )
}

/// Delivery facts read the same staging table as the delivery dimension,
/// under their own watermark.
pub fn delivery_facts_stream(staging_schema: &str) -> Stream {
    Stream::new(
        "fct_delivery_raw_to_dds_workflow",
        TableName::new(staging_schema, DELIVERIES_STAGING_TABLE),
    )
}
