/*
 * execute_request.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::empty_object;
use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend to execute code
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteRequest {
    /// The code to be executed
    pub code: String,

    /// Whether the code should be executed silently (no reply is sent, and
    /// the execution counter is not advanced)
    pub silent: bool,

    /// Whether the code should be stored in history
    pub store_history: bool,

    /// Mapping of user expressions to be evaluated after code is executed;
    /// always emitted, as an empty object
    #[serde(default = "empty_object")]
    pub user_expressions: Value,

    /// Whether to allow the kernel to send stdin requests
    pub allow_stdin: bool,

    /// Whether the kernel should discard the execution queue if evaluating the
    /// code results in an error
    pub stop_on_error: bool,
}

impl ExecuteRequest {
    /// An execution request with the protocol's defaults: not silent, stored
    /// in history, stdin allowed, and errors tolerated.
    pub fn new(code: String) -> Self {
        Self {
            code,
            silent: false,
            store_history: true,
            user_expressions: empty_object(),
            allow_stdin: true,
            stop_on_error: false,
        }
    }
}

impl MessageType for ExecuteRequest {
    fn message_type() -> String {
        String::from("execute_request")
    }
}
