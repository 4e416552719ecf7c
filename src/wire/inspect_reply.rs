/*
 * inspect_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::display_data::DisplayData;
use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;
use crate::wire::operation_result::OperationResult;

/// Represents a reply from the kernel giving code inspection results
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct InspectReply {
    pub result: OperationResult<InspectOk>,
}

/// The fields of a successful inspection reply
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InspectOk {
    /// True if an object was found
    pub found: bool,

    /// MIME bundle giving information about the object; empty when nothing
    /// was found
    #[serde(flatten)]
    pub display: DisplayData,
}

impl InspectReply {
    /// Inspection found something to show.
    pub fn found(display: DisplayData) -> Self {
        Self {
            result: OperationResult::Ok(InspectOk {
                found: true,
                display,
            }),
        }
    }

    /// Inspection found nothing; `data` and `metadata` are emitted empty.
    pub fn not_found() -> Self {
        Self {
            result: OperationResult::Ok(InspectOk {
                found: false,
                display: DisplayData::new(),
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

impl MessageType for InspectReply {
    fn message_type() -> String {
        String::from("inspect_reply")
    }
}
