use crate::error::EtlResult;
use crate::target::{ConflictPolicy, Dimension};
use crate::types::StagedRecord;

/// An order of the order system, its status moves forward until it is final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_key: String,
    pub order_status: String,
}

impl Dimension for Order {
    const NAME: &'static str = "order";
    const CONFLICT_POLICY: ConflictPolicy = ConflictPolicy::Update;

    fn parse(record: &StagedRecord) -> EtlResult<Self> {
        Ok(Order {
            order_key: record.str_field("_id")?.to_owned(),
            order_status: record.str_field("final_status")?.to_owned(),
        })
    }

    fn natural_key(&self) -> &str {
        &self.order_key
    }
}
