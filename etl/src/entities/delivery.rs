use crate::error::EtlResult;
use crate::target::{ConflictPolicy, Dimension};
use crate::types::StagedRecord;

/// A delivery, it carries no attributes besides its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivery_id: String,
}

impl Dimension for Delivery {
    const NAME: &'static str = "delivery";
    const CONFLICT_POLICY: ConflictPolicy = ConflictPolicy::Ignore;

    fn parse(record: &StagedRecord) -> EtlResult<Self> {
        Ok(Delivery {
            delivery_id: record.str_field("delivery_id")?.to_owned(),
        })
    }

    fn natural_key(&self) -> &str {
        &self.delivery_id
    }
}
