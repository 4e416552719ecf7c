/*
 * comm_msg.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a message on an open comm channel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommMsg {
    pub comm_id: String,
    pub data: Value,
}

impl MessageType for CommMsg {
    fn message_type() -> String {
        String::from("comm_msg")
    }
}
