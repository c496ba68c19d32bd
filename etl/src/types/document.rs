use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::{bail, etl_error};
use crate::error::{EtlError, ErrorKind};

/// A document as returned by an upstream provider, before normalization.
pub type Document = BTreeMap<String, DocumentValue>;

/// Provider independent representation of a document value.
///
/// Mirrors JSON with one addition: identifier objects of document stores,
/// which have no portable representation and must be normalized before they
/// are staged.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above [`i64::MAX`].
    UInt(u64),
    Float(f64),
    String(String),
    ObjectId(ObjectId),
    Array(Vec<DocumentValue>),
    Map(Document),
}

/// Key of the single-entry object used by extended JSON to encode an [`ObjectId`].
const EXTENDED_JSON_OID_KEY: &str = "$oid";

impl DocumentValue {
    /// Converts a JSON value into a document value.
    ///
    /// Extended JSON identifiers (`{"$oid": "<24 hex digits>"}`) become
    /// [`DocumentValue::ObjectId`], everything else maps one to one.
    pub fn from_json(value: Value) -> DocumentValue {
        match value {
            Value::Null => DocumentValue::Null,
            Value::Bool(value) => DocumentValue::Bool(value),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    DocumentValue::Int(value)
                } else if let Some(value) = number.as_u64() {
                    DocumentValue::UInt(value)
                } else {
                    number
                        .as_f64()
                        .map(DocumentValue::Float)
                        .unwrap_or(DocumentValue::Null)
                }
            }
            Value::String(value) => DocumentValue::String(value),
            Value::Array(values) => {
                DocumentValue::Array(values.into_iter().map(DocumentValue::from_json).collect())
            }
            Value::Object(map) => {
                if map.len() == 1
                    && let Some(Value::String(hex)) = map.get(EXTENDED_JSON_OID_KEY)
                    && let Ok(oid) = hex.parse::<ObjectId>()
                {
                    return DocumentValue::ObjectId(oid);
                }

                DocumentValue::Map(
                    map.into_iter()
                        .map(|(key, value)| (key, DocumentValue::from_json(value)))
                        .collect(),
                )
            }
        }
    }
}

/// Converts a JSON object into a [`Document`], `None` for any other JSON value.
pub fn document_from_json(value: Value) -> Option<Document> {
    match DocumentValue::from_json(value) {
        DocumentValue::Map(document) => Some(document),
        _ => None,
    }
}

/// 12 byte identifier generated by document stores for every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }
}

impl fmt::Display for ObjectId {
    /// Renders the identifier as 24 lowercase hex digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 || !s.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            bail!(
                ErrorKind::InvalidPayload,
                "Invalid object id",
                format!("`{s}` is not 24 hex digits")
            );
        }

        let mut bytes = [0u8; 12];
        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[index * 2..index * 2 + 2], 16)
                .map_err(|err| etl_error!(ErrorKind::InvalidPayload, "Invalid object id", err))?;
        }

        Ok(ObjectId(bytes))
    }
}
