/*
 * execute_reply.rs
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

/// Represents a reply from an execute_request message
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct ExecuteReply {
    pub result: OperationResult<ExecuteOk>,
}

/// The fields of a successful execution reply
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteOk {
    /// Monotonically increasing execution counter
    pub execution_count: u32,

    /// Results for user expressions
    #[serde(default = "empty_object")]
    pub user_expressions: Value,
}

impl ExecuteReply {
    pub fn ok(execution_count: u32) -> Self {
        Self {
            result: OperationResult::Ok(ExecuteOk {
                execution_count,
                user_expressions: empty_object(),
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

impl MessageType for ExecuteReply {
    fn message_type() -> String {
        String::from("execute_reply")
    }
}
