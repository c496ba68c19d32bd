use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Between applying a staged record to the warehouse and checkpointing its id.
pub const APPLY_RECORD__BEFORE_WATERMARK_SAVE: &str = "apply_record.before_watermark_save";

/// Between fetching a page from the upstream API and staging its documents.
pub const STAGING_COPY__BEFORE_WRITE: &str = "staging_copy.before_write";

/// Fails with [`ErrorKind::InjectedFault`] when the named fail point is enabled.
pub fn etl_fail_point(name: &str) -> EtlResult<()> {
    fail_point!(name, |_| {
        bail!(
            ErrorKind::InjectedFault,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
