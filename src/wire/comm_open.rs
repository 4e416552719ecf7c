/*
 * comm_open.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::empty_object;
use crate::wire::jupyter_message::MessageType;

/// Represents a request to open a custom comm channel. Either side may send
/// this; the comm is identified by a UUID chosen by the opener.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommOpen {
    /// The unique ID of the comm being opened
    pub comm_id: String,

    /// The name of the handler expected on the receiving side
    pub target_name: String,

    /// The module in which the receiving side should look for the handler,
    /// if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_module: Option<String>,

    /// Free-form payload delivered alongside the open
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl MessageType for CommOpen {
    fn message_type() -> String {
        String::from("comm_open")
    }
}
