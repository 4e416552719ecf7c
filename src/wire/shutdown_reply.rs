/*
 * shutdown_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a reply to a shutdown_request; echoes the restart flag of the
/// request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShutdownReply {
    pub restart: bool,
}

impl MessageType for ShutdownReply {
    fn message_type() -> String {
        String::from("shutdown_reply")
    }
}
