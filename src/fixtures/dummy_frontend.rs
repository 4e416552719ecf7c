/*
 * dummy_frontend.rs
 *
 * Copyright (C) 2022-2024 Posit Software, PBC. All rights reserved.
 *
 */

use rand::Rng;

use crate::connection_file::ConnectionFile;
use crate::session::Session;
use crate::socket::socket::Socket;
use crate::wire::execute_request::ExecuteRequest;
use crate::wire::header::JupyterHeader;
use crate::wire::jupyter_message::Comm;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::KernelOutput;
use crate::wire::jupyter_message::KernelReply;
use crate::wire::jupyter_message::KernelRequest;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::ProtocolMessage;
use crate::wire::kernel_info_request::KernelInfoRequest;
use crate::wire::status::ExecutionState;
use crate::wire::wire_message::WireMessage;
use crate::wire::wire_message::MSG_DELIM;

/// A synthetic frontend for driving a kernel under test: one connected socket
/// per channel, plus typed send/receive helpers.
pub struct DummyFrontend {
    pub shell_socket: Socket,
    pub control_socket: Socket,
    pub iopub_socket: Socket,
    pub stdin_socket: Socket,
    pub heartbeat_socket: Socket,
    pub session: Session,
}

/// Generate a random HMAC signing key for a test kernel.
pub fn random_key() -> String {
    let key_bytes = rand::thread_rng().gen::<[u8; 16]>();
    hex::encode(key_bytes)
}

impl DummyFrontend {
    /// Connect a frontend to a running kernel. The connection information
    /// must carry the kernel's effective (bound) ports.
    pub fn connect(connection_file: &ConnectionFile) -> Self {
        let session = Session::create(connection_file.key.as_str()).unwrap();
        let ctx = zmq::Context::new();

        // Create a random socket identity for the shell and stdin sockets.
        // Per the Jupyter specification, these must share a ZeroMQ identity.
        let shell_id = rand::thread_rng().gen::<[u8; 16]>();

        let shell_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Shell"),
            zmq::DEALER,
            Some(&shell_id),
            connection_file.endpoint(connection_file.shell_port),
        )
        .unwrap();

        let control_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Control"),
            zmq::DEALER,
            None,
            connection_file.endpoint(connection_file.control_port),
        )
        .unwrap();

        let iopub_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("IOPub"),
            zmq::SUB,
            None,
            connection_file.endpoint(connection_file.iopub_port),
        )
        .unwrap();
        iopub_socket.subscribe().unwrap();

        let stdin_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Stdin"),
            zmq::DEALER,
            Some(&shell_id),
            connection_file.endpoint(connection_file.stdin_port),
        )
        .unwrap();

        let heartbeat_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Heartbeat"),
            zmq::REQ,
            None,
            connection_file.endpoint(connection_file.hb_port),
        )
        .unwrap();

        // Give the PUB/SUB pair a moment to finish the subscription
        // handshake; messages published before it completes are dropped
        // (tests only send requests after this, so nothing is lost).
        std::thread::sleep(std::time::Duration::from_millis(250));

        Self {
            shell_socket,
            control_socket,
            iopub_socket,
            stdin_socket,
            heartbeat_socket,
            session,
        }
    }

    /// Sends a Jupyter message on the Shell socket; returns the ID of the
    /// newly created message
    pub fn send_shell<T: ProtocolMessage>(&self, msg: T) -> String {
        Self::send(&self.shell_socket, &self.session, msg)
    }

    /// Sends a Jupyter message on the Control socket
    pub fn send_control<T: ProtocolMessage>(&self, msg: T) -> String {
        Self::send(&self.control_socket, &self.session, msg)
    }

    /// Sends a Jupyter message on the Stdin socket
    pub fn send_stdin<T: ProtocolMessage>(&self, msg: T) -> String {
        Self::send(&self.stdin_socket, &self.session, msg)
    }

    pub fn send_execute_request(&self, code: &str, options: ExecuteRequestOptions) -> String {
        let mut request = ExecuteRequest::new(String::from(code));
        request.silent = options.silent;
        request.allow_stdin = options.allow_stdin;
        self.send_shell(request)
    }

    /// Sends a kernel_info_request whose content frame has been modified
    /// after signing; a well-behaved kernel discards it. Returns the message
    /// ID so tests can assert that no reply references it.
    pub fn send_shell_tampered(&self) -> String {
        use hmac::Mac;

        let header = JupyterHeader::create(
            KernelInfoRequest::message_type(),
            self.session.session_id.clone(),
            self.session.username.clone(),
        );
        let msg_id = header.msg_id.clone();

        let header = serde_json::to_vec(&header).unwrap();
        let empty = b"{}".to_vec();
        let signed_parts = [&header, &empty, &empty, &empty];

        let mut signer = self.session.hmac.clone().expect("fixture requires a key");
        for part in signed_parts {
            signer.update(part);
        }
        let signature = hex::encode(signer.finalize().into_bytes());

        // Swap in different content after computing the signature
        let frames = vec![
            MSG_DELIM.to_vec(),
            signature.into_bytes(),
            header,
            empty.clone(),
            empty,
            b"{\"tampered\":true}".to_vec(),
        ];
        self.shell_socket.send_multipart(&frames).unwrap();
        msg_id
    }

    fn send<T: ProtocolMessage>(socket: &Socket, session: &Session, msg: T) -> String {
        let message = JupyterMessage::create(msg, None, session);
        let id = message.header.msg_id.clone();
        message.send(socket).unwrap();
        id
    }

    /// Receives a message from a socket, with a timeout so that a test does
    /// not hang indefinitely when the kernel fails to produce the expected
    /// message.
    pub fn recv(socket: &Socket) -> WireMessage {
        if socket.poll_incoming(10000).unwrap() {
            return WireMessage::read_from_socket(socket).unwrap();
        }
        panic!("Timeout while expecting message on socket {}", socket.name);
    }

    /// Receives a Jupyter message from the Shell socket
    pub fn recv_shell(&self) -> WireMessage {
        Self::recv(&self.shell_socket)
    }

    /// Receives a typed reply from the Shell socket
    pub fn recv_shell_reply(&self) -> (WireMessage, KernelReply) {
        let message = self.recv_shell();
        let reply = KernelReply::try_from(&message).unwrap();
        (message, reply)
    }

    /// Receives a typed reply from the Control socket
    pub fn recv_control_reply(&self) -> (WireMessage, KernelReply) {
        let message = Self::recv(&self.control_socket);
        let reply = KernelReply::try_from(&message).unwrap();
        (message, reply)
    }

    /// Receives a Jupyter message from the IOPub socket
    pub fn recv_iopub(&self) -> WireMessage {
        Self::recv(&self.iopub_socket)
    }

    /// Receives a typed kernel output from the IOPub socket
    pub fn recv_iopub_output(&self) -> (WireMessage, KernelOutput) {
        let message = self.recv_iopub();
        let output = KernelOutput::try_from(&message).unwrap();
        (message, output)
    }

    /// Receives a typed comm message from the IOPub socket
    pub fn recv_iopub_comm(&self) -> (WireMessage, Comm) {
        let message = self.recv_iopub();
        let comm = Comm::try_from(&message).unwrap();
        (message, comm)
    }

    /// Receives from IOPub and asserts a status message with the given
    /// execution state; returns its wire envelope for parenting assertions
    pub fn assert_iopub_status(&self, expected: ExecutionState) -> WireMessage {
        let (message, output) = self.recv_iopub_output();
        match output {
            KernelOutput::Status(status) => {
                assert_eq!(status.execution_state, expected);
                message
            }
            other => panic!("Expected status message on IOPub, got {other:?}"),
        }
    }

    /// Receives a typed kernel request from the Stdin socket
    pub fn recv_stdin_request(&self) -> (WireMessage, KernelRequest) {
        let message = Self::recv(&self.stdin_socket);
        let request = KernelRequest::try_from(&message).unwrap();
        (message, request)
    }

    /// Receives a (raw) message from the heartbeat socket
    pub fn recv_heartbeat(&self) -> zmq::Message {
        let mut msg = zmq::Message::new();
        if !self.heartbeat_socket.poll_incoming(10000).unwrap() {
            panic!("Timeout while expecting heartbeat echo");
        }
        self.heartbeat_socket.recv(&mut msg).unwrap();
        msg
    }

    /// Sends a (raw) message to the heartbeat socket
    pub fn send_heartbeat(&self, msg: zmq::Message) {
        self.heartbeat_socket.send(msg).unwrap();
    }
}

pub struct ExecuteRequestOptions {
    pub silent: bool,
    pub allow_stdin: bool,
}

impl Default for ExecuteRequestOptions {
    fn default() -> Self {
        Self {
            silent: false,
            allow_stdin: false,
        }
    }
}
