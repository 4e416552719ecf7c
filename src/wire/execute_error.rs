/*
 * execute_error.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;

/// Represents an exception that occurred while executing code. This is
/// published to IOPub; not to be confused with the error form of
/// `execute_reply`, which travels on the shell socket.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteError {
    /// The exception that occurred during execution
    #[serde(flatten)]
    pub exception: Exception,
}

impl MessageType for ExecuteError {
    fn message_type() -> String {
        String::from("error")
    }
}
