/*
 * jupyter_message.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::session::Session;
use crate::socket::socket::Socket;
use crate::wire::clear_output::ClearOutput;
use crate::wire::comm_close::CommClose;
use crate::wire::comm_info_reply::CommInfoReply;
use crate::wire::comm_info_request::CommInfoRequest;
use crate::wire::comm_msg::CommMsg;
use crate::wire::comm_open::CommOpen;
use crate::wire::complete_reply::CompleteReply;
use crate::wire::complete_request::CompleteRequest;
use crate::wire::connect_reply::ConnectReply;
use crate::wire::connect_request::ConnectRequest;
use crate::wire::display_data::DisplayData;
use crate::wire::execute_error::ExecuteError;
use crate::wire::execute_input::ExecuteInput;
use crate::wire::execute_reply::ExecuteReply;
use crate::wire::execute_request::ExecuteRequest;
use crate::wire::execute_result::ExecuteResult;
use crate::wire::header::JupyterHeader;
use crate::wire::history_reply::HistoryReply;
use crate::wire::history_request::HistoryRequest;
use crate::wire::input_reply::InputReply;
use crate::wire::input_request::InputRequest;
use crate::wire::inspect_reply::InspectReply;
use crate::wire::inspect_request::InspectRequest;
use crate::wire::is_complete_reply::IsCompleteReply;
use crate::wire::is_complete_request::IsCompleteRequest;
use crate::wire::kernel_info_reply::KernelInfoReply;
use crate::wire::kernel_info_request::KernelInfoRequest;
use crate::wire::shutdown_reply::ShutdownReply;
use crate::wire::shutdown_request::ShutdownRequest;
use crate::wire::status::KernelStatus;
use crate::wire::stream::StreamOutput;
use crate::wire::wire_message::WireMessage;

/// Trait used to extract the wire message type from a Jupyter message
pub trait MessageType {
    fn message_type() -> String;
}

/// Convenience trait for grouping traits that must be present on all Jupyter
/// protocol messages
pub trait ProtocolMessage: MessageType + Serialize + std::fmt::Debug + Clone {}
impl<T> ProtocolMessage for T where T: MessageType + Serialize + std::fmt::Debug + Clone {}

/// Represents a status returned inside non-operation replies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

/// Represents a single typed Jupyter message
#[derive(Debug, Clone)]
pub struct JupyterMessage<T> {
    /// The ZeroMQ identities (for ROUTER sockets)
    pub zmq_identities: Vec<Vec<u8>>,

    /// The header for this message
    pub header: JupyterHeader,

    /// The header of the message from which this message originated. Optional;
    /// not all messages have a parent.
    pub parent_header: Option<JupyterHeader>,

    /// The body (payload) of the message
    pub content: T,
}

impl<T> JupyterMessage<T>
where
    T: ProtocolMessage,
{
    /// Create a new Jupyter message, optionally as a child (reply) to an
    /// existing message.
    pub fn create(content: T, parent: Option<JupyterHeader>, session: &Session) -> Self {
        Self {
            zmq_identities: Vec::new(),
            header: JupyterHeader::create(
                T::message_type(),
                session.session_id.clone(),
                session.username.clone(),
            ),
            parent_header: parent,
            content,
        }
    }

    /// Sends this Jupyter message to the designated ZeroMQ socket.
    pub fn send(self, socket: &Socket) -> Result<(), Error> {
        let msg = WireMessage::try_from(&self)?;
        msg.send(socket)?;
        Ok(())
    }
}

// Conversion: WireMessage (untyped) -> JupyterMessage (typed); used on
// messages we receive over the wire to parse into the correct type.
impl<T: ProtocolMessage + DeserializeOwned> TryFrom<&WireMessage> for JupyterMessage<T> {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<JupyterMessage<T>, Error> {
        Ok(JupyterMessage {
            zmq_identities: msg.zmq_identities.clone(),
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            content: content(msg)?,
        })
    }
}

// Conversion: JupyterMessage (typed) -> WireMessage (untyped); used prior to
// sending messages to get them ready for dispatch.
impl<T: ProtocolMessage> TryFrom<&JupyterMessage<T>> for WireMessage {
    type Error = crate::error::Error;

    fn try_from(msg: &JupyterMessage<T>) -> Result<Self, Error> {
        let content = match serde_json::to_value(msg.content.clone()) {
            Ok(val) => val,
            Err(err) => return Err(Error::CannotSerialize(err)),
        };
        Ok(WireMessage::create(
            msg.header.clone(),
            msg.parent_header.clone(),
            msg.zmq_identities.clone(),
            content,
        ))
    }
}

/// Coerce the content of a wire message into a concrete message type.
fn content<T: MessageType + DeserializeOwned>(msg: &WireMessage) -> Result<T, Error> {
    match serde_json::from_value(msg.content.clone()) {
        Ok(content) => Ok(content),
        Err(err) => Err(Error::InvalidMessage(
            T::message_type(),
            msg.content.clone(),
            err,
        )),
    }
}

/// Serialize the content of a message for transmission.
fn to_content<T: Serialize>(content: &T) -> Result<Value, Error> {
    serde_json::to_value(content).map_err(Error::CannotSerialize)
}

/// The requests a client may send on the shell or control socket. Each request
/// is answered by exactly one `KernelReply` of the paired variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    Execute(ExecuteRequest),
    Inspect(InspectRequest),
    History(HistoryRequest),
    Complete(CompleteRequest),
    IsComplete(IsCompleteRequest),
    Connect(ConnectRequest),
    CommInfo(CommInfoRequest),
    KernelInfo(KernelInfoRequest),
    Shutdown(ShutdownRequest),
}

impl ClientRequest {
    /// The wire type tag of this request.
    pub fn message_type(&self) -> String {
        match self {
            Self::Execute(_) => ExecuteRequest::message_type(),
            Self::Inspect(_) => InspectRequest::message_type(),
            Self::History(_) => HistoryRequest::message_type(),
            Self::Complete(_) => CompleteRequest::message_type(),
            Self::IsComplete(_) => IsCompleteRequest::message_type(),
            Self::Connect(_) => ConnectRequest::message_type(),
            Self::CommInfo(_) => CommInfoRequest::message_type(),
            Self::KernelInfo(_) => KernelInfoRequest::message_type(),
            Self::Shutdown(_) => ShutdownRequest::message_type(),
        }
    }

    pub fn to_content(&self) -> Result<Value, Error> {
        match self {
            Self::Execute(msg) => to_content(msg),
            Self::Inspect(msg) => to_content(msg),
            Self::History(msg) => to_content(msg),
            Self::Complete(msg) => to_content(msg),
            Self::IsComplete(msg) => to_content(msg),
            Self::Connect(msg) => to_content(msg),
            Self::CommInfo(msg) => to_content(msg),
            Self::KernelInfo(msg) => to_content(msg),
            Self::Shutdown(msg) => to_content(msg),
        }
    }
}

impl TryFrom<&WireMessage> for ClientRequest {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();
        if kind == ExecuteRequest::message_type() {
            return Ok(Self::Execute(content(msg)?));
        }
        if kind == InspectRequest::message_type() {
            return Ok(Self::Inspect(content(msg)?));
        }
        if kind == HistoryRequest::message_type() {
            return Ok(Self::History(content(msg)?));
        }
        if kind == CompleteRequest::message_type() {
            return Ok(Self::Complete(content(msg)?));
        }
        if kind == IsCompleteRequest::message_type() {
            return Ok(Self::IsComplete(content(msg)?));
        }
        if kind == ConnectRequest::message_type() {
            return Ok(Self::Connect(content(msg)?));
        }
        if kind == CommInfoRequest::message_type() {
            return Ok(Self::CommInfo(content(msg)?));
        }
        if kind == KernelInfoRequest::message_type() {
            return Ok(Self::KernelInfo(content(msg)?));
        }
        if kind == ShutdownRequest::message_type() {
            return Ok(Self::Shutdown(content(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}

/// The replies a kernel sends on the shell or control socket, paired 1:1 with
/// the `ClientRequest` variants by type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelReply {
    Execute(ExecuteReply),
    Inspect(InspectReply),
    History(HistoryReply),
    Complete(CompleteReply),
    IsComplete(IsCompleteReply),
    Connect(ConnectReply),
    CommInfo(CommInfoReply),
    KernelInfo(KernelInfoReply),
    Shutdown(ShutdownReply),
}

impl KernelReply {
    /// The wire type tag of this reply.
    pub fn message_type(&self) -> String {
        match self {
            Self::Execute(_) => ExecuteReply::message_type(),
            Self::Inspect(_) => InspectReply::message_type(),
            Self::History(_) => HistoryReply::message_type(),
            Self::Complete(_) => CompleteReply::message_type(),
            Self::IsComplete(_) => IsCompleteReply::message_type(),
            Self::Connect(_) => ConnectReply::message_type(),
            Self::CommInfo(_) => CommInfoReply::message_type(),
            Self::KernelInfo(_) => KernelInfoReply::message_type(),
            Self::Shutdown(_) => ShutdownReply::message_type(),
        }
    }

    pub fn to_content(&self) -> Result<Value, Error> {
        match self {
            Self::Execute(msg) => to_content(msg),
            Self::Inspect(msg) => to_content(msg),
            Self::History(msg) => to_content(msg),
            Self::Complete(msg) => to_content(msg),
            Self::IsComplete(msg) => to_content(msg),
            Self::Connect(msg) => to_content(msg),
            Self::CommInfo(msg) => to_content(msg),
            Self::KernelInfo(msg) => to_content(msg),
            Self::Shutdown(msg) => to_content(msg),
        }
    }
}

impl TryFrom<&WireMessage> for KernelReply {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();
        if kind == ExecuteReply::message_type() {
            return Ok(Self::Execute(content(msg)?));
        }
        if kind == InspectReply::message_type() {
            return Ok(Self::Inspect(content(msg)?));
        }
        if kind == HistoryReply::message_type() {
            return Ok(Self::History(content(msg)?));
        }
        if kind == CompleteReply::message_type() {
            return Ok(Self::Complete(content(msg)?));
        }
        if kind == IsCompleteReply::message_type() {
            return Ok(Self::IsComplete(content(msg)?));
        }
        if kind == ConnectReply::message_type() {
            return Ok(Self::Connect(content(msg)?));
        }
        if kind == CommInfoReply::message_type() {
            return Ok(Self::CommInfo(content(msg)?));
        }
        if kind == KernelInfoReply::message_type() {
            return Ok(Self::KernelInfo(content(msg)?));
        }
        if kind == ShutdownReply::message_type() {
            return Ok(Self::Shutdown(content(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}

/// The outputs a kernel publishes on the iopub socket.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelOutput {
    Stream(StreamOutput),
    DisplayData(DisplayData),
    ExecuteInput(ExecuteInput),
    ExecuteResult(ExecuteResult),
    ExecuteError(ExecuteError),
    Status(KernelStatus),
    ClearOutput(ClearOutput),
}

impl KernelOutput {
    /// The wire type tag of this output.
    pub fn message_type(&self) -> String {
        match self {
            Self::Stream(_) => StreamOutput::message_type(),
            Self::DisplayData(_) => DisplayData::message_type(),
            Self::ExecuteInput(_) => ExecuteInput::message_type(),
            Self::ExecuteResult(_) => ExecuteResult::message_type(),
            Self::ExecuteError(_) => ExecuteError::message_type(),
            Self::Status(_) => KernelStatus::message_type(),
            Self::ClearOutput(_) => ClearOutput::message_type(),
        }
    }

    pub fn to_content(&self) -> Result<Value, Error> {
        match self {
            Self::Stream(msg) => to_content(msg),
            Self::DisplayData(msg) => to_content(msg),
            Self::ExecuteInput(msg) => to_content(msg),
            Self::ExecuteResult(msg) => to_content(msg),
            Self::ExecuteError(msg) => to_content(msg),
            Self::Status(msg) => to_content(msg),
            Self::ClearOutput(msg) => to_content(msg),
        }
    }
}

impl TryFrom<&WireMessage> for KernelOutput {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();
        if kind == StreamOutput::message_type() {
            return Ok(Self::Stream(content(msg)?));
        }
        if kind == DisplayData::message_type() {
            return Ok(Self::DisplayData(content(msg)?));
        }
        if kind == ExecuteInput::message_type() {
            return Ok(Self::ExecuteInput(content(msg)?));
        }
        if kind == ExecuteResult::message_type() {
            return Ok(Self::ExecuteResult(content(msg)?));
        }
        if kind == ExecuteError::message_type() {
            return Ok(Self::ExecuteError(content(msg)?));
        }
        if kind == KernelStatus::message_type() {
            return Ok(Self::Status(content(msg)?));
        }
        if kind == ClearOutput::message_type() {
            return Ok(Self::ClearOutput(content(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}

/// The requests a kernel sends to the client on the stdin socket.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelRequest {
    Input(InputRequest),
}

impl KernelRequest {
    pub fn message_type(&self) -> String {
        match self {
            Self::Input(_) => InputRequest::message_type(),
        }
    }

    pub fn to_content(&self) -> Result<Value, Error> {
        match self {
            Self::Input(msg) => to_content(msg),
        }
    }
}

impl TryFrom<&WireMessage> for KernelRequest {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();
        if kind == InputRequest::message_type() {
            return Ok(Self::Input(content(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}

/// The replies a client sends back to the kernel on the stdin socket.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientReply {
    Input(InputReply),
}

impl ClientReply {
    pub fn message_type(&self) -> String {
        match self {
            Self::Input(_) => InputReply::message_type(),
        }
    }

    pub fn to_content(&self) -> Result<Value, Error> {
        match self {
            Self::Input(msg) => to_content(msg),
        }
    }
}

impl TryFrom<&WireMessage> for ClientReply {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();
        if kind == InputReply::message_type() {
            return Ok(Self::Input(content(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}

/// Free-form comm traffic. Comms are symmetric: either side may open, message
/// or close one. Kernels publish comms on iopub; clients send them upstream
/// on the shell socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Comm {
    Open(CommOpen),
    Msg(CommMsg),
    Close(CommClose),
}

impl Comm {
    pub fn message_type(&self) -> String {
        match self {
            Self::Open(_) => CommOpen::message_type(),
            Self::Msg(_) => CommMsg::message_type(),
            Self::Close(_) => CommClose::message_type(),
        }
    }

    pub fn to_content(&self) -> Result<Value, Error> {
        match self {
            Self::Open(msg) => to_content(msg),
            Self::Msg(msg) => to_content(msg),
            Self::Close(msg) => to_content(msg),
        }
    }
}

impl TryFrom<&WireMessage> for Comm {
    type Error = crate::error::Error;

    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();
        if kind == CommOpen::message_type() {
            return Ok(Self::Open(content(msg)?));
        }
        if kind == CommMsg::message_type() {
            return Ok(Self::Msg(content(msg)?));
        }
        if kind == CommClose::message_type() {
            return Ok(Self::Close(content(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}
