/*
 * status.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a message from the kernel advertising its execution state
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KernelStatus {
    pub execution_state: ExecutionState,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// The kernel has started up but not yet processed a message. Decoded for
    /// completeness; the dispatch engine itself only publishes busy and idle.
    Starting,

    /// The kernel is processing a request
    Busy,

    /// The kernel is ready for another request
    Idle,
}

impl KernelStatus {
    pub fn busy() -> Self {
        Self {
            execution_state: ExecutionState::Busy,
        }
    }

    pub fn idle() -> Self {
        Self {
            execution_state: ExecutionState::Idle,
        }
    }
}

impl MessageType for KernelStatus {
    fn message_type() -> String {
        String::from("status")
    }
}
