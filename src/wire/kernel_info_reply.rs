/*
 * kernel_info_reply.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::header::PROTOCOL_VERSION;
use crate::wire::help_link::HelpLink;
use crate::wire::jupyter_message::MessageType;
use crate::wire::language_info::LanguageInfo;

/// Represents a reply to a kernel_info_request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KernelInfoReply {
    /// Version of messaging protocol
    pub protocol_version: String,

    /// The name of the kernel implementation (e.g. "ipython")
    pub implementation: String,

    /// The version of the kernel implementation
    pub implementation_version: String,

    /// Information about the language the kernel supports
    pub language_info: LanguageInfo,

    /// A startup banner
    pub banner: String,

    /// A list of help links
    #[serde(default)]
    pub help_links: Vec<HelpLink>,
}

impl KernelInfoReply {
    /// A minimal info reply for a kernel that only cares about its name; the
    /// remaining fields take innocuous defaults.
    pub fn simple(name: &str) -> Self {
        Self {
            protocol_version: String::from(PROTOCOL_VERSION),
            implementation: String::from(name),
            implementation_version: String::from("0.0"),
            language_info: LanguageInfo {
                name: String::from(name),
                version: String::from("0.0"),
                mimetype: String::from("text/plain"),
                file_extension: String::from(".txt"),
            },
            banner: String::new(),
            help_links: vec![],
        }
    }
}

impl MessageType for KernelInfoReply {
    fn message_type() -> String {
        String::from("kernel_info_reply")
    }
}
