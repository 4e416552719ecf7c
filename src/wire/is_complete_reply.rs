/*
 * is_complete_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a reply to an is_complete_request. The variant is carried in
/// the `status` field; an incomplete fragment additionally suggests the
/// characters with which to indent the next line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IsCompleteReply {
    /// The code is a complete expression, ready to execute
    Complete,

    /// The code is incomplete; more input is expected
    Incomplete { indent: String },

    /// The code is invalid and will produce an error if executed
    Invalid,

    /// The kernel cannot tell
    Unknown,
}

impl MessageType for IsCompleteReply {
    fn message_type() -> String {
        String::from("is_complete_reply")
    }
}
