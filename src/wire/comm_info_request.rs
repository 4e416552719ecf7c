/*
 * comm_info_request.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend to list open comms, optionally
/// restricted to a single target name
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommInfoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
}

impl MessageType for CommInfoRequest {
    fn message_type() -> String {
        String::from("comm_info_request")
    }
}
