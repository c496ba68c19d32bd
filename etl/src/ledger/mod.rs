//! The courier ledger datamart: monthly settlements rebuilt from delivery facts.

mod base;
mod memory;
mod postgres;
mod refresh;
pub mod rules;

pub use base::{CourierDelivery, CourierLedgerEntry, CourierLedgerRepository};
pub use memory::MemoryCourierLedger;
pub use refresh::CourierLedgerRefresher;
