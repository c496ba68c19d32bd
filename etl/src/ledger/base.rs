use std::future::Future;

use chrono::NaiveDateTime;

use crate::error::EtlResult;

/// A delivered order as seen by the ledger: the fact measures plus the
/// natural key and name of its courier.
#[derive(Debug, Clone, PartialEq)]
pub struct CourierDelivery {
    pub courier_id: String,
    pub courier_name: String,
    pub order_ts: NaiveDateTime,
    pub rate: i32,
    pub total_sum: f64,
    pub tip_sum: f64,
}

/// Monthly settlement of one courier.
#[derive(Debug, Clone, PartialEq)]
pub struct CourierLedgerEntry {
    pub courier_id: String,
    pub courier_name: String,
    pub settlement_year: i32,
    pub settlement_month: u32,
    pub orders_count: u32,
    pub orders_total_sum: f64,
    pub rate_avg: f64,
    /// Share of the order sums kept by the company.
    pub order_processing_fee: f64,
    /// Share of the order sums paid to the courier, depends on `rate_avg`.
    pub courier_order_sum: f64,
    pub courier_tips_sum: f64,
    pub courier_reward_sum: f64,
}

/// Source of delivered orders and storage of the rebuilt ledger.
pub trait CourierLedgerRepository {
    /// Returns every delivery fact with its courier.
    fn deliveries(&self) -> impl Future<Output = EtlResult<Vec<CourierDelivery>>> + Send;

    /// Atomically replaces the stored ledger with `entries`.
    fn replace(&self, entries: &[CourierLedgerEntry])
    -> impl Future<Output = EtlResult<()>> + Send;
}
