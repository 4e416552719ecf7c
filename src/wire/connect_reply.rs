/*
 * connect_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::connection_file::ConnectionFile;
use crate::wire::jupyter_message::MessageType;

/// Represents a reply to a connect_request, listing the ports the kernel's
/// sockets are bound to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConnectReply {
    pub shell_port: u16,
    pub iopub_port: u16,
    pub stdin_port: u16,
    pub hb_port: u16,
}

impl From<&ConnectionFile> for ConnectReply {
    fn from(connection_file: &ConnectionFile) -> Self {
        Self {
            shell_port: connection_file.shell_port,
            iopub_port: connection_file.iopub_port,
            stdin_port: connection_file.stdin_port,
            hb_port: connection_file.hb_port,
        }
    }
}

impl MessageType for ConnectReply {
    fn message_type() -> String {
        String::from("connect_reply")
    }
}
