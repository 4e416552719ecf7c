/*
 * complete_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::empty_object;
use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;
use crate::wire::operation_result::OperationResult;

/// Represents a reply to a complete_request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct CompleteReply {
    pub result: OperationResult<CompleteOk>,
}

/// The fields of a successful completion reply
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompleteOk {
    /// The completion candidates
    pub matches: Vec<String>,

    /// The span of text to be replaced by a candidate, in Unicode code points
    pub cursor_start: u32,
    pub cursor_end: u32,

    /// Additional metadata, if any
    #[serde(default = "empty_object")]
    pub metadata: Value,
}

impl CompleteReply {
    pub fn ok(matches: Vec<String>, cursor_start: u32, cursor_end: u32) -> Self {
        Self {
            result: OperationResult::Ok(CompleteOk {
                matches,
                cursor_start,
                cursor_end,
                metadata: empty_object(),
            }),
        }
    }

    pub fn error(exception: Exception) -> Self {
        Self {
            result: OperationResult::Error(exception),
        }
    }

    pub fn abort() -> Self {
        Self {
            result: OperationResult::Abort,
        }
    }
}

impl MessageType for CompleteReply {
    fn message_type() -> String {
        String::from("complete_reply")
    }
}
