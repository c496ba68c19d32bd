//! The dimensional model the loaders write to.

mod base;
mod memory;
mod postgres;

pub use base::{
    ConflictPolicy, Dimension, DimensionRepository, DimensionRow, Fact, FactRepository,
};
pub use memory::{MemoryDimensionRepository, MemoryFactRepository};
pub use self::postgres::PostgresWarehouse;
