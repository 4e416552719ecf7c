/*
 * history_request.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend for entries from the kernel's
/// execution history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryRequest {
    /// Whether to include the outputs alongside the inputs
    pub output: bool,

    /// Whether to return the raw (rather than transformed) input
    pub raw: bool,

    /// Which slice of history is wanted; the selector's fields are flattened
    /// into the content object alongside the `hist_access_type` discriminator
    #[serde(flatten)]
    pub access: HistoryAccessType,
}

/// The three ways a frontend can address history
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "hist_access_type", rename_all = "snake_case")]
pub enum HistoryAccessType {
    /// A range of lines from a single session; a negative session counts
    /// backwards from the current one
    Range { session: i64, start: i64, stop: i64 },

    /// The last `n` entries
    Tail { n: i64 },

    /// Entries matching a glob pattern
    Search { pattern: String, unique: bool },
}

impl MessageType for HistoryRequest {
    fn message_type() -> String {
        String::from("history_request")
    }
}
