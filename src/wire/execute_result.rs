/*
 * execute_result.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::display_data::DisplayData;
use crate::wire::jupyter_message::MessageType;

/// Represents the published result of an execution
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExecuteResult {
    /// A monotonically increasing execution counter
    pub execution_count: u32,

    /// The data giving the result of the execution
    #[serde(flatten)]
    pub display: DisplayData,
}

impl MessageType for ExecuteResult {
    fn message_type() -> String {
        String::from("execute_result")
    }
}
