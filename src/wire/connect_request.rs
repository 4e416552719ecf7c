/*
 * connect_request.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend for the ports the kernel is bound to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConnectRequest {}

impl MessageType for ConnectRequest {
    fn message_type() -> String {
        String::from("connect_request")
    }
}
