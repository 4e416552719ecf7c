/*
 * operation_result.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::wire::exception::Exception;

/// The outcome of a kernel operation: success with operation-specific fields,
/// an error, or an abort. On the wire the outcome is discriminated by the
/// `status` field of the content object; the success fields are flattened as
/// siblings of `status`.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    Ok(T),
    Error(Exception),
    Abort,
}

impl<T> Serialize for OperationResult<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;

        let (status, body) = match self {
            OperationResult::Ok(value) => {
                ("ok", serde_json::to_value(value).map_err(S::Error::custom)?)
            }
            OperationResult::Error(exception) => (
                "error",
                serde_json::to_value(exception).map_err(S::Error::custom)?,
            ),
            OperationResult::Abort => ("abort", Value::Object(Map::new())),
        };

        let mut map = match body {
            Value::Object(map) => map,
            other => {
                return Err(S::Error::custom(format!(
                    "operation result body must be a JSON object (got {})",
                    other
                )))
            }
        };
        map.insert(String::from("status"), Value::String(String::from(status)));
        map.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for OperationResult<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        let status = match value.get("status").and_then(Value::as_str) {
            Some(status) => status.to_string(),
            None => return Err(D::Error::missing_field("status")),
        };
        match status.as_str() {
            "ok" => Ok(OperationResult::Ok(
                T::deserialize(value).map_err(D::Error::custom)?,
            )),
            "error" => Ok(OperationResult::Error(
                Exception::deserialize(value).map_err(D::Error::custom)?,
            )),
            "abort" => Ok(OperationResult::Abort),
            other => Err(D::Error::custom(format!(
                "unknown operation status '{}'",
                other
            ))),
        }
    }
}
