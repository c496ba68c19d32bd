//! Incremental synchronization of a delivery warehouse.
//!
//! Raw documents are copied from upstream collections into append-only
//! staging tables by [`staging::copier::StagingCopier`]. Loaders in
//! [`loaders`] then move staged records into the dimensional model, each
//! stream checkpointing a watermark after every applied record so that runs
//! can be repeated or interrupted at any point. The [`ledger`] datamart is
//! rebuilt from the loaded facts afterwards.
//!
//! Storage is abstracted behind traits with a memory and a Postgres
//! implementation each: [`store::watermark::WatermarkStore`],
//! [`staging::StagedReader`], [`staging::StagingWriter`],
//! [`target::DimensionRepository`] and [`target::FactRepository`].

pub mod entities;
pub mod error;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod ledger;
pub mod loaders;
mod macros;
pub mod staging;
pub mod store;
pub mod target;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
