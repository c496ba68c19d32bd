mod base;
mod memory;
mod postgres;

pub use base::WatermarkStore;
pub use memory::MemoryWatermarkStore;
pub use self::postgres::PostgresWatermarkStore;
