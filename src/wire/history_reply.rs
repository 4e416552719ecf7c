/*
 * history_reply.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a reply from the kernel carrying execution history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryReply {
    /// The requested history entries
    pub history: Vec<HistoryEntry>,
}

/// A single history entry. On the wire, entries are tuples:
/// `[session, line, input]` when outputs were not requested, and
/// `[session, line, [input, output]]` when they were.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub session: i64,
    pub line: i64,
    pub input: String,
    pub output: Option<String>,
}

impl Serialize for HistoryEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.output {
            None => (self.session, self.line, &self.input).serialize(serializer),
            Some(output) => (self.session, self.line, (&self.input, output)).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for HistoryEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        let parts = match value.as_array() {
            Some(parts) if parts.len() == 3 => parts,
            _ => {
                return Err(D::Error::custom(
                    "history entry must be a three-element array",
                ))
            }
        };

        let session = parts[0]
            .as_i64()
            .ok_or_else(|| D::Error::custom("history entry session must be an integer"))?;
        let line = parts[1]
            .as_i64()
            .ok_or_else(|| D::Error::custom("history entry line must be an integer"))?;

        match &parts[2] {
            Value::String(input) => Ok(HistoryEntry {
                session,
                line,
                input: input.clone(),
                output: None,
            }),
            Value::Array(pair) if pair.len() == 2 => {
                let input = pair[0]
                    .as_str()
                    .ok_or_else(|| D::Error::custom("history entry input must be a string"))?;
                let output = pair[1]
                    .as_str()
                    .ok_or_else(|| D::Error::custom("history entry output must be a string"))?;
                Ok(HistoryEntry {
                    session,
                    line,
                    input: input.to_string(),
                    output: Some(output.to_string()),
                })
            }
            _ => Err(D::Error::custom(
                "history entry must end with an input or an input/output pair",
            )),
        }
    }
}

impl MessageType for HistoryReply {
    fn message_type() -> String {
        String::from("history_reply")
    }
}
