/*
 * mod.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

pub mod clear_output;
pub mod comm_close;
pub mod comm_info_reply;
pub mod comm_info_request;
pub mod comm_msg;
pub mod comm_open;
pub mod complete_reply;
pub mod complete_request;
pub mod connect_reply;
pub mod connect_request;
pub mod display_data;
pub mod exception;
pub mod execute_error;
pub mod execute_input;
pub mod execute_reply;
pub mod execute_request;
pub mod execute_result;
pub mod header;
pub mod help_link;
pub mod history_reply;
pub mod history_request;
pub mod input_reply;
pub mod input_request;
pub mod inspect_reply;
pub mod inspect_request;
pub mod is_complete_reply;
pub mod is_complete_request;
pub mod jupyter_message;
pub mod kernel_info_reply;
pub mod kernel_info_request;
pub mod language_info;
pub mod operation_result;
pub mod shutdown_reply;
pub mod shutdown_request;
pub mod status;
pub mod stream;
pub mod wire_message;

/// The empty JSON object used as the default for free-form mapping fields.
pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
