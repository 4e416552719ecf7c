/*
 * execute_input.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a message from the kernel rebroadcasting the code it is about to
/// execute, so all frontends can display it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteInput {
    /// The code being executed
    pub code: String,

    /// A monotonically increasing execution counter
    pub execution_count: u32,
}

impl MessageType for ExecuteInput {
    fn message_type() -> String {
        String::from("execute_input")
    }
}
