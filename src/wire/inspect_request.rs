/*
 * inspect_request.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend to inspect a fragment of code
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InspectRequest {
    /// The code fragment to inspect
    pub code: String,

    /// The position of the cursor in the fragment, in Unicode code points
    pub cursor_pos: u32,

    /// How much detail to include in the inspection reply
    pub detail_level: DetailLevel,
}

/// The level of detail requested for an inspection; serialized as `0` (low)
/// or `1` (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    Low,
    High,
}

impl Serialize for DetailLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            DetailLevel::Low => serializer.serialize_u8(0),
            DetailLevel::High => serializer.serialize_u8(1),
        }
    }
}

impl<'de> Deserialize<'de> for DetailLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        match u8::deserialize(deserializer)? {
            0 => Ok(DetailLevel::Low),
            1 => Ok(DetailLevel::High),
            other => Err(D::Error::custom(format!(
                "detail level must be 0 or 1 (got {})",
                other
            ))),
        }
    }
}

impl MessageType for InspectRequest {
    fn message_type() -> String {
        String::from("inspect_request")
    }
}
