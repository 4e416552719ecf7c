/*
 * clear_output.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a message from the kernel asking frontends to clear the output
/// area of the originating cell
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClearOutput {
    /// When true, defer clearing until the next output arrives; this avoids
    /// flicker in loops that repeatedly clear and redraw
    pub wait: bool,
}

impl MessageType for ClearOutput {
    fn message_type() -> String {
        String::from("clear_output")
    }
}
