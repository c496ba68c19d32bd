//! Helpers for tests of the loaders and the staging copier.
//!
//! Everything here works against the memory implementations, Postgres backed
//! tests use `postgres::test_utils::PgDatabase` for an isolated database.

#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod fixtures;
pub mod upstream;
