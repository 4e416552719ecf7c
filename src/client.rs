/*
 * client.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;

use crossbeam::channel::unbounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;

use crate::connection_file::ConnectionFile;
use crate::error::Error;
use crate::language::client_handler::ClientHandler;
use crate::session::Session;
use crate::socket::socket::Socket;
use crate::socket::socket::POLL_INTERVAL_MS;
use crate::wire::header::JupyterHeader;
use crate::wire::jupyter_message::ClientRequest;
use crate::wire::jupyter_message::Comm;
use crate::wire::jupyter_message::KernelOutput;
use crate::wire::jupyter_message::KernelReply;
use crate::wire::jupyter_message::KernelRequest;
use crate::wire::wire_message::WireMessage;

/// The client dispatch engine: drives a kernel the way a frontend does.
///
/// Two background listeners are spawned on connect: one subscribed to
/// everything on iopub, and one serving the kernel's input requests on stdin.
/// Both dispatch to the user-provided handler. The calling thread sends
/// requests with `send_request`, which blocks until the kernel's typed reply
/// arrives on the same socket.
///
/// The listeners are linked to the client: if either fails, the failure is
/// raised from the next call into the client (or from `shutdown`).
pub struct Client {
    shell: Arc<Mutex<Socket>>,
    control: Mutex<Socket>,
    heartbeat: Mutex<Socket>,
    session: Session,
    shutdown: Arc<AtomicBool>,
    error_rx: Receiver<Error>,
    workers: Vec<JoinHandle<()>>,
}

impl Client {
    /// Connect to the kernel described by the connection information, using
    /// the given handler for messages the kernel originates. The username is
    /// attached to every message header this client creates.
    pub fn connect(
        connection_file: &ConnectionFile,
        username: Option<String>,
        handler: Arc<Mutex<dyn ClientHandler>>,
    ) -> crate::Result<Client> {
        connection_file.validate_signature_scheme()?;

        let ctx = zmq::Context::new();
        let session = match username {
            Some(username) => Session::with_username(connection_file.key.as_str(), username)?,
            None => Session::create(connection_file.key.as_str())?,
        };

        // The shell and stdin sockets must share a ZeroMQ identity so the
        // kernel can route input requests to the peer whose execution needs
        // them.
        let identity = session.session_id.clone();
        let identity = identity.as_bytes();

        let shell_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Shell"),
            zmq::DEALER,
            Some(identity),
            connection_file.endpoint(connection_file.shell_port),
        )?;

        let control_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Control"),
            zmq::DEALER,
            Some(identity),
            connection_file.endpoint(connection_file.control_port),
        )?;

        let iopub_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("IOPub"),
            zmq::SUB,
            None,
            connection_file.endpoint(connection_file.iopub_port),
        )?;
        iopub_socket.subscribe()?;

        let stdin_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Stdin"),
            zmq::DEALER,
            Some(identity),
            connection_file.endpoint(connection_file.stdin_port),
        )?;

        let heartbeat_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Heartbeat"),
            zmq::REQ,
            None,
            connection_file.endpoint(connection_file.hb_port),
        )?;

        let shell = Arc::new(Mutex::new(shell_socket));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (error_tx, error_rx) = unbounded();
        let mut workers = Vec::new();

        // Start the iopub listener.
        {
            let handler = handler.clone();
            let shell = shell.clone();
            let shutdown = shutdown.clone();
            workers.push(spawn_listener(
                String::from("client-iopub"),
                error_tx.clone(),
                move || iopub_listener(iopub_socket, handler, shell, shutdown),
            )?);
        }

        // Start the stdin listener.
        {
            let handler = handler.clone();
            let shell = shell.clone();
            let shutdown = shutdown.clone();
            workers.push(spawn_listener(
                String::from("client-stdin"),
                error_tx.clone(),
                move || stdin_listener(stdin_socket, handler, shell, shutdown),
            )?);
        }

        Ok(Client {
            shell,
            control: Mutex::new(control_socket),
            heartbeat: Mutex::new(heartbeat_socket),
            session,
            shutdown,
            error_rx,
            workers,
        })
    }

    /// Send a request on the shell socket and block until the kernel's reply
    /// to it arrives there.
    pub fn send_request(&self, request: &ClientRequest) -> crate::Result<KernelReply> {
        self.check_listeners()?;
        let socket = self.shell.lock().unwrap();
        self.request_reply(&socket, request)
    }

    /// Send a request on the control socket and block for the reply. Control
    /// serves the same request set as shell on a channel that stays
    /// responsive while the kernel is busy; shutdown requests conventionally
    /// travel here.
    pub fn send_control_request(&self, request: &ClientRequest) -> crate::Result<KernelReply> {
        self.check_listeners()?;
        let socket = self.control.lock().unwrap();
        self.request_reply(&socket, request)
    }

    /// Send comm traffic upstream on the shell socket. Fire-and-forget: comms
    /// have no replies.
    pub fn send_comm(&self, comm: &Comm) -> crate::Result<()> {
        self.check_listeners()?;
        let socket = self.shell.lock().unwrap();
        let header = JupyterHeader::create(
            comm.message_type(),
            self.session.session_id.clone(),
            self.session.username.clone(),
        );
        let msg = WireMessage::create(header, None, Vec::new(), comm.to_content()?);
        msg.send(&socket)
    }

    /// Send a frame on the heartbeat socket and block for the kernel's echo.
    pub fn heartbeat(&self, data: &[u8]) -> crate::Result<Vec<u8>> {
        self.check_listeners()?;
        let socket = self.heartbeat.lock().unwrap();
        socket.send(zmq::Message::from(data))?;
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Err(Error::Cancelled);
            }
            if !socket.poll_incoming(POLL_INTERVAL_MS)? {
                continue;
            }
            let mut msg = zmq::Message::new();
            socket.recv(&mut msg)?;
            return Ok(msg.to_vec());
        }
    }

    /// Cancel the background listeners and wait for them to exit. Returns the
    /// first listener failure, if one had already occurred.
    pub fn shutdown(self) -> crate::Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        for worker in self.workers {
            if worker.join().is_err() {
                log::error!("A client listener thread panicked during shutdown");
            }
        }
        match self.error_rx.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }

    fn request_reply(
        &self,
        socket: &Socket,
        request: &ClientRequest,
    ) -> crate::Result<KernelReply> {
        let header = JupyterHeader::create(
            request.message_type(),
            self.session.session_id.clone(),
            self.session.username.clone(),
        );
        let msg_id = header.msg_id.clone();
        let msg = WireMessage::create(header, None, Vec::new(), request.to_content()?);
        msg.send(socket)?;

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Err(Error::Cancelled);
            }
            self.check_listeners()?;
            if !socket.poll_incoming(POLL_INTERVAL_MS)? {
                continue;
            }

            let reply = match WireMessage::read_from_socket(socket) {
                Ok(reply) => reply,
                Err(err @ Error::ZmqError(..)) => return Err(err),
                Err(err) => {
                    log::warn!("Discarding message on {} socket: {err}", socket.name);
                    continue;
                }
            };

            // Correlate by parent: the reply to our request carries its
            // message ID in the parent header.
            match &reply.parent_header {
                Some(parent) if parent.msg_id == msg_id => return KernelReply::try_from(&reply),
                _ => {
                    log::warn!(
                        "Discarding unexpected '{}' message on {} socket",
                        reply.header.msg_type,
                        socket.name
                    );
                }
            }
        }
    }

    /// Surface the first background listener failure, if any.
    fn check_listeners(&self) -> crate::Result<()> {
        match self.error_rx.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }
}

/// Callbacks handed to the client handler, bound to the kernel message being
/// handled. Comms sent through them travel upstream on the shell socket,
/// parented to that message.
pub struct ClientCallbacks {
    shell: Arc<Mutex<Socket>>,
    parent: JupyterHeader,
}

impl ClientCallbacks {
    fn new(shell: Arc<Mutex<Socket>>, parent: JupyterHeader) -> Self {
        Self { shell, parent }
    }

    /// The header of the kernel message being handled.
    pub fn parent(&self) -> &JupyterHeader {
        &self.parent
    }

    /// Send comm traffic in response to the message being handled. Clients
    /// publish comms upstream on the shell socket, not on iopub.
    pub fn send_comm(&self, comm: Comm) -> crate::Result<()> {
        let content = comm.to_content()?;
        let socket = self.shell.lock().unwrap();
        let msg = WireMessage::create(
            self.parent.reply(comm.message_type()),
            Some(self.parent.clone()),
            Vec::new(),
            content,
        );
        msg.send(&socket)
    }
}

/// The iopub listener: decodes everything the kernel publishes and dispatches
/// outputs and comms to the handler. An unparseable message is fatal here;
/// dropping iopub traffic silently would leave the caller with an untrusted
/// view of the kernel's output ordering.
fn iopub_listener(
    socket: Socket,
    handler: Arc<Mutex<dyn ClientHandler>>,
    shell: Arc<Mutex<Socket>>,
    shutdown: Arc<AtomicBool>,
) -> crate::Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        if !socket.poll_incoming(POLL_INTERVAL_MS)? {
            continue;
        }

        let message = match WireMessage::read_from_socket(&socket) {
            Ok(message) => message,
            Err(err @ Error::ZmqError(..)) => return Err(err),
            Err(
                err @ (Error::BadSignature(..)
                | Error::InvalidHmac(..)
                | Error::MissingDelimiter
                | Error::InsufficientParts(..)),
            ) => {
                // Tampered or malformed envelopes are discarded like on every
                // other channel; only body decode failures are fatal here
                log::warn!("Discarding message on {} socket: {err}", socket.name);
                continue;
            }
            Err(err) => return Err(err),
        };

        let callbacks = ClientCallbacks::new(shell.clone(), message.header.clone());
        match KernelOutput::try_from(&message) {
            Ok(output) => {
                let mut handler = handler.lock().unwrap();
                handler.handle_output(&callbacks, output)?;
            }
            Err(Error::UnknownMessageType(_)) => {
                let comm = Comm::try_from(&message)?;
                let mut handler = handler.lock().unwrap();
                handler.handle_comm(&callbacks, comm)?;
            }
            Err(err) => return Err(err),
        }
    }
}

/// The stdin listener: serves the kernel's input requests by invoking the
/// handler and sending its reply back on the same socket. Like iopub, decode
/// failures are fatal.
fn stdin_listener(
    socket: Socket,
    handler: Arc<Mutex<dyn ClientHandler>>,
    shell: Arc<Mutex<Socket>>,
    shutdown: Arc<AtomicBool>,
) -> crate::Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        if !socket.poll_incoming(POLL_INTERVAL_MS)? {
            continue;
        }

        let message = match WireMessage::read_from_socket(&socket) {
            Ok(message) => message,
            Err(err @ Error::ZmqError(..)) => return Err(err),
            Err(
                err @ (Error::BadSignature(..)
                | Error::InvalidHmac(..)
                | Error::MissingDelimiter
                | Error::InsufficientParts(..)),
            ) => {
                log::warn!("Discarding message on {} socket: {err}", socket.name);
                continue;
            }
            Err(err) => return Err(err),
        };

        let request = KernelRequest::try_from(&message)?;
        let callbacks = ClientCallbacks::new(shell.clone(), message.header.clone());
        let reply = {
            let mut handler = handler.lock().unwrap();
            handler.handle_kernel_request(&callbacks, request)?
        };

        let wire = WireMessage::create(
            message.header.reply(reply.message_type()),
            Some(message.header.clone()),
            message.zmq_identities.clone(),
            reply.to_content()?,
        );
        wire.send(&socket)?;
    }
}

/// Spawn a supervised listener thread; a fatal error is forwarded to the
/// client's error channel.
fn spawn_listener<F>(
    name: String,
    error_tx: Sender<Error>,
    listener: F,
) -> crate::Result<JoinHandle<()>>
where
    F: FnOnce() -> crate::Result<()> + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            if let Err(err) = listener() {
                log::error!("Listener thread failed: {err}");
                let _ = error_tx.send(err);
            }
        })
        .map_err(|err| Error::CreateThreadFailed(name, err))
}
