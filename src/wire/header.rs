/*
 * header.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// The version of the Jupyter messaging protocol spoken here.
pub const PROTOCOL_VERSION: &str = "5.0";

/// Generate a fresh identifier in the canonical Jupyter form: 32 lowercase
/// hexadecimal characters, no hyphens.
pub fn new_uuid() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Represents the header of a Jupyter message
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JupyterHeader {
    /// The message identifier; must be unique per message
    pub msg_id: String,

    /// The ID of the session that created the message
    pub session: String,

    /// The username of the user who created the message
    pub username: String,

    /// Date/time when message was created (ISO 8601). Optional on receive,
    /// always emitted on send.
    #[serde(default)]
    pub date: String,

    /// Message type
    pub msg_type: String,

    /// Message protocol version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    String::from(PROTOCOL_VERSION)
}

impl JupyterHeader {
    /// Create a new header for a message originating from a session. The
    /// message ID and timestamp are freshly generated.
    pub fn create(msg_type: String, session: String, username: String) -> Self {
        Self {
            msg_id: new_uuid(),
            session,
            username,
            date: Utc::now().to_rfc3339(),
            msg_type,
            version: String::from(PROTOCOL_VERSION),
        }
    }

    /// Create the header of a message sent in response to a message carrying
    /// this header. The session and username are carried over from the
    /// originating message; the caller attaches this header's owner as the
    /// parent.
    pub fn reply(&self, msg_type: String) -> Self {
        Self::create(msg_type, self.session.clone(), self.username.clone())
    }
}
