//! Loaders moving staged records into the dimensional model.
//!
//! Every loader follows the same protocol, implemented once by
//! [`IncrementalLoader`]: read the stream watermark, fetch the staged records
//! above it, apply them one by one in id order and checkpoint the watermark
//! after each applied record. A crash between a write and its checkpoint
//! replays that record on the next run, which is harmless because every write
//! is an upsert.

pub mod dimension;
pub mod fact;
pub mod incremental;

pub use dimension::DimensionLoader;
pub use fact::{FactLoader, FactResolver, Resolution};
pub use incremental::{
    ApplyOutcome, HaltedRecord, IncrementalLoader, LoadReport, MissingDependency, RecordApplier,
};
