use std::fmt;

use chrono::NaiveDateTime;
use serde_json::Value;

pub use postgres::types::TableName;

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::{bail, etl_error};

/// A raw upstream document as persisted in the staging area.
///
/// Staged records are append-only, `id` is assigned by the staging store and
/// defines processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    pub id: i64,
    pub natural_key: String,
    pub payload: Value,
    pub loaded_at: NaiveDateTime,
}

impl StagedRecord {
    fn field(&self, name: &str) -> EtlResult<&Value> {
        match self.payload.get(name) {
            Some(Value::Null) | None => bail!(
                ErrorKind::InvalidPayload,
                "Staged payload is missing a field",
                format!("record {} has no `{name}`", self.id)
            ),
            Some(value) => Ok(value),
        }
    }

    fn mistyped(&self, name: &str, expected: &str, value: &Value) -> EtlError {
        etl_error!(
            ErrorKind::InvalidPayload,
            "Staged payload has a mistyped field",
            format!(
                "record {} has `{name}` = {value}, expected {expected}",
                self.id
            )
        )
    }

    /// Returns the string field `name` of the payload.
    pub fn str_field(&self, name: &str) -> EtlResult<&str> {
        let value = self.field(name)?;
        value
            .as_str()
            .ok_or_else(|| self.mistyped(name, "a string", value))
    }

    /// Returns the integer field `name` of the payload.
    pub fn i64_field(&self, name: &str) -> EtlResult<i64> {
        let value = self.field(name)?;
        value
            .as_i64()
            .ok_or_else(|| self.mistyped(name, "an integer", value))
    }

    /// Returns the numeric field `name` of the payload, integers are widened.
    pub fn f64_field(&self, name: &str) -> EtlResult<f64> {
        let value = self.field(name)?;
        value
            .as_f64()
            .ok_or_else(|| self.mistyped(name, "a number", value))
    }
}

/// A synchronization stream: one staging table consumed under one workflow key.
///
/// Several streams may read the same staging table, each keeps its own watermark.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stream {
    pub workflow_key: String,
    pub source: TableName,
}

impl Stream {
    pub fn new(workflow_key: impl Into<String>, source: TableName) -> Stream {
        Self {
            workflow_key: workflow_key.into(),
            source,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.workflow_key, self.source)
    }
}
