use crate::error::EtlResult;
use crate::target::{ConflictPolicy, Dimension};
use crate::types::StagedRecord;

/// A courier of the delivery system, renamed couriers keep their row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Courier {
    pub courier_id: String,
    pub courier_name: String,
}

impl Dimension for Courier {
    const NAME: &'static str = "courier";
    const CONFLICT_POLICY: ConflictPolicy = ConflictPolicy::Update;

    fn parse(record: &StagedRecord) -> EtlResult<Self> {
        Ok(Courier {
            courier_id: record.str_field("_id")?.to_owned(),
            courier_name: record.str_field("name")?.to_owned(),
        })
    }

    fn natural_key(&self) -> &str {
        &self.courier_id
    }
}
