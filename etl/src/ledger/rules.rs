use std::collections::BTreeMap;

use chrono::Datelike;

use crate::ledger::{CourierDelivery, CourierLedgerEntry};

/// Share of every order sum kept as processing fee.
const ORDER_PROCESSING_FEE_RATE: f64 = 0.25;

/// Share of the tips paid out to the courier, the rest covers payment fees.
const TIPS_PAYOUT_RATE: f64 = 0.95;

/// Courier share of an order as `(lower bound of the average rating, share of
/// the order sum, minimum paid per order)`, highest tier first.
const COURIER_SHARE_TIERS: [(f64, f64, f64); 4] = [
    (4.9, 0.10, 200.0),
    (4.5, 0.08, 175.0),
    (4.0, 0.07, 150.0),
    (f64::NEG_INFINITY, 0.05, 100.0),
];

/// What a courier with the monthly average rating `rate_avg` earns for one order.
pub fn courier_order_share(rate_avg: f64, order_sum: f64) -> f64 {
    let (_, share, minimum) = COURIER_SHARE_TIERS
        .iter()
        .copied()
        .find(|(lower, _, _)| rate_avg >= *lower)
        .unwrap_or(COURIER_SHARE_TIERS[COURIER_SHARE_TIERS.len() - 1]);

    (order_sum * share).max(minimum)
}

/// Builds the ledger: one entry per courier and month of `order_ts`.
///
/// The rating tier is chosen from the monthly average, then applied to every
/// order of that month. Entries are ordered by courier, year and month.
pub fn build_courier_ledger(deliveries: &[CourierDelivery]) -> Vec<CourierLedgerEntry> {
    let mut months: BTreeMap<(&str, i32, u32), Vec<&CourierDelivery>> = BTreeMap::new();
    for delivery in deliveries {
        let key = (
            delivery.courier_id.as_str(),
            delivery.order_ts.year(),
            delivery.order_ts.month(),
        );
        months.entry(key).or_default().push(delivery);
    }

    months
        .into_iter()
        .map(|((courier_id, year, month), deliveries)| {
            let orders_count = deliveries.len();
            let rate_sum: f64 = deliveries.iter().map(|d| f64::from(d.rate)).sum();
            let rate_avg = rate_sum / orders_count as f64;

            let orders_total_sum: f64 = deliveries.iter().map(|d| d.total_sum).sum();
            let courier_order_sum: f64 = deliveries
                .iter()
                .map(|d| courier_order_share(rate_avg, d.total_sum))
                .sum();
            let courier_tips_sum: f64 = deliveries.iter().map(|d| d.tip_sum).sum();

            CourierLedgerEntry {
                courier_id: courier_id.to_owned(),
                // The latest name wins when a courier is renamed within a month.
                courier_name: deliveries[orders_count - 1].courier_name.clone(),
                settlement_year: year,
                settlement_month: month,
                orders_count: orders_count as u32,
                orders_total_sum,
                rate_avg,
                order_processing_fee: orders_total_sum * ORDER_PROCESSING_FEE_RATE,
                courier_order_sum,
                courier_tips_sum,
                courier_reward_sum: courier_order_sum + courier_tips_sum * TIPS_PAYOUT_RATE,
            }
        })
        .collect()
}
