use postgres::cdm::{CourierLedgerRow, get_courier_deliveries, replace_courier_ledger};

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::ledger::{CourierDelivery, CourierLedgerEntry, CourierLedgerRepository};
use crate::target::PostgresWarehouse;

impl CourierLedgerRepository for PostgresWarehouse {
    async fn deliveries(&self) -> EtlResult<Vec<CourierDelivery>> {
        let rows = get_courier_deliveries(self.pool()).await?;

        Ok(rows
            .into_iter()
            .map(|row| CourierDelivery {
                courier_id: row.courier_id,
                courier_name: row.courier_name,
                order_ts: row.order_ts,
                rate: row.rate,
                total_sum: row.total_sum,
                tip_sum: row.tip_sum,
            })
            .collect())
    }

    async fn replace(&self, entries: &[CourierLedgerEntry]) -> EtlResult<()> {
        let rows = entries
            .iter()
            .map(ledger_row)
            .collect::<EtlResult<Vec<_>>>()?;

        replace_courier_ledger(self.pool(), &rows).await?;

        Ok(())
    }
}

fn ledger_row(entry: &CourierLedgerEntry) -> EtlResult<CourierLedgerRow> {
    let orders_count = i32::try_from(entry.orders_count).map_err(|err| {
        etl_error!(
            ErrorKind::InvalidState,
            "Courier ledger entry does not fit the ledger table",
            format!("courier `{}` has {} orders", entry.courier_id, entry.orders_count),
            source: err
        )
    })?;

    Ok(CourierLedgerRow {
        courier_id: entry.courier_id.clone(),
        courier_name: entry.courier_name.clone(),
        settlement_year: entry.settlement_year,
        // Months are 1 to 12.
        settlement_month: entry.settlement_month as i32,
        orders_count,
        orders_total_sum: entry.orders_total_sum,
        rate_avg: entry.rate_avg,
        order_processing_fee: entry.order_processing_fee,
        courier_order_sum: entry.courier_order_sum,
        courier_tips_sum: entry.courier_tips_sum,
        courier_reward_sum: entry.courier_reward_sum,
    })
}
