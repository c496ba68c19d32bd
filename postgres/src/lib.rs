//! Postgres access for the warehouse: DDL, staging tables, the dimensional
//! model, the courier ledger datamart and the workflow settings table that
//! stores watermarks.

pub mod cdm;
pub mod dds;
pub mod pool;
pub mod schema;
pub mod staging;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod types;
pub mod watermark;
