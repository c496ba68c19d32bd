//! Staging area: the raw copy of upstream collections that loaders read from.

mod base;
pub mod copier;
pub mod http;
mod memory;
pub mod normalize;
mod postgres;
pub mod upstream;

pub use base::{StagedReader, StagingWriter};
pub use memory::MemoryStaging;
pub use self::postgres::PostgresStaging;
