/*
 * comm_info_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents a reply from the kernel listing open comms
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommInfoReply {
    /// The status of the request (usually "ok")
    pub status: Status,

    /// Dictionary of comms, indexed by UUID; each entry is an object carrying
    /// the comm's target name
    pub comms: Map<String, Value>,
}

/// Represents comm info for a single target
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommInfoTargetName {
    pub target_name: String,
}

impl CommInfoReply {
    /// Build a reply from (comm id, target name) pairs.
    pub fn from_comms<I>(comms: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut info = Map::new();
        for (comm_id, target_name) in comms {
            let target = CommInfoTargetName { target_name };
            if let Ok(value) = serde_json::to_value(target) {
                info.insert(comm_id, value);
            }
        }
        Self {
            status: Status::Ok,
            comms: info,
        }
    }
}

impl MessageType for CommInfoReply {
    fn message_type() -> String {
        String::from("comm_info_reply")
    }
}
