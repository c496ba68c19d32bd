use chrono::NaiveDateTime;
use serde_json::{Value, json};

use crate::staging::{MemoryStaging, StagingWriter};
use crate::types::TableName;

/// Timestamp used as `loaded_at` for staged fixtures.
pub fn fixed_loaded_at() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2022-09-14 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Staged payload of a courier as copied from the delivery system.
pub fn courier_payload(courier_id: &str, name: &str) -> Value {
    json!({"_id": courier_id, "name": name})
}

/// Staged payload of an order as copied from the order system.
pub fn order_payload(order_key: &str, final_status: &str) -> Value {
    json!({
        "_id": order_key,
        "final_status": final_status,
        "update_ts": "2022-09-13 22:47:37",
    })
}

/// Staged payload of a delivery, carrying both the delivery dimension and the fact.
pub fn delivery_payload(delivery_id: &str, order_id: &str, courier_id: &str) -> Value {
    json!({
        "order_id": order_id,
        "order_ts": "2022-09-13 22:47:37.826000",
        "delivery_id": delivery_id,
        "courier_id": courier_id,
        "address": "Ул. Льва Толстого, 5, кв. 318",
        "delivery_ts": "2022-09-13 23:31:42.019000",
        "rate": 4,
        "sum": 3480,
        "tip_sum": 174
    })
}

/// Appends `payloads` to `table`, creating it if needed, and returns the assigned ids.
///
/// Each payload is keyed by the string value of `key_field`.
pub async fn stage(
    staging: &MemoryStaging,
    table: &TableName,
    key_field: &str,
    payloads: &[Value],
) -> Vec<i64> {
    staging.init_table(table).await.unwrap();

    let mut ids = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let key = payload[key_field].as_str().unwrap_or_default();
        let id = staging
            .append(table, key, fixed_loaded_at(), payload)
            .await
            .unwrap();
        ids.push(id);
    }

    ids
}
