/*
 * comm_close.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::empty_object;
use crate::wire::jupyter_message::MessageType;

/// Represents a request to close an open comm channel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommClose {
    /// The unique ID of the comm being closed
    pub comm_id: String,

    /// Free-form payload delivered alongside the close
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl MessageType for CommClose {
    fn message_type() -> String {
        String::from("comm_close")
    }
}
