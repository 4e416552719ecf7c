/*
 * router.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use crate::error::Error;
use crate::kernel::KernelCallbacks;
use crate::language::kernel_handler::KernelHandler;
use crate::socket::socket::Socket;
use crate::socket::socket::POLL_INTERVAL_MS;
use crate::wire::jupyter_message::ClientRequest;
use crate::wire::jupyter_message::Comm;
use crate::wire::jupyter_message::KernelOutput;
use crate::wire::jupyter_message::KernelReply;
use crate::wire::status::KernelStatus;
use crate::wire::wire_message::WireMessage;

/// The receive loop for a kernel request socket. The shell and control
/// channels run one instance each of this router; the dispatch logic is
/// identical for both.
///
/// Each inbound message is classified as a client request or comm traffic and
/// handed to the handler with callbacks bound to it; for a request, the
/// handler's reply goes back out on the same socket, routed to the requesting
/// peer via the identities copied from the inbound message.
pub struct Router {
    /// The ZeroMQ request socket (Shell or Control)
    socket: Socket,

    /// The IOPub socket, shared with the sibling router for publisher
    /// callbacks
    iopub: Arc<Mutex<Socket>>,

    /// The Stdin socket, shared with the sibling router for input round-trips
    stdin: Arc<Mutex<Socket>>,

    /// The language-provided handler object, shared with the sibling router
    /// and invoked concurrently from both
    handler: Arc<dyn KernelHandler>,

    shutdown: Arc<AtomicBool>,
}

impl Router {
    pub fn new(
        socket: Socket,
        iopub: Arc<Mutex<Socket>>,
        stdin: Arc<Mutex<Socket>>,
        handler: Arc<dyn KernelHandler>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            socket,
            iopub,
            stdin,
            handler,
            shutdown,
        }
    }

    /// The name of the socket this router serves.
    pub fn name(&self) -> &str {
        &self.socket.name
    }

    /// Main loop; to be invoked from the router's worker thread. Returns when
    /// the engine shuts down, or with an error when the socket fails or a
    /// handler reports an error.
    pub fn listen(&self) -> crate::Result<()> {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Ok(());
            }
            if !self.socket.poll_incoming(POLL_INTERVAL_MS)? {
                continue;
            }

            // Attempt to read the next message from the socket. Messages that
            // fail signature validation or envelope parsing are discarded;
            // they do not affect the worker.
            let message = match WireMessage::read_from_socket(&self.socket) {
                Ok(message) => message,
                Err(err @ Error::ZmqError(..)) => return Err(err),
                Err(err) => {
                    log::warn!("Discarding message on {} socket: {err}", self.socket.name);
                    continue;
                }
            };

            self.dispatch(message)?;
        }
    }

    /// Classify an inbound message and hand it to the handler. Decode
    /// failures are logged and the message dropped; handler errors are fatal
    /// and propagate to the supervisor.
    fn dispatch(&self, message: WireMessage) -> crate::Result<()> {
        match ClientRequest::try_from(&message) {
            Ok(request) => self.handle_request(&message, request),
            Err(Error::UnknownMessageType(_)) => match Comm::try_from(&message) {
                Ok(comm) => self.handle_comm(&message, comm),
                Err(Error::UnknownMessageType(kind)) => {
                    log::warn!(
                        "Unknown message type '{kind}' on {} socket; ignoring",
                        self.socket.name
                    );
                    Ok(())
                }
                Err(err) => {
                    log::warn!(
                        "Could not decode comm message on {} socket: {err}",
                        self.socket.name
                    );
                    Ok(())
                }
            },
            Err(err) => {
                log::warn!(
                    "Could not decode request on {} socket: {err}",
                    self.socket.name
                );
                Ok(())
            }
        }
    }

    fn handle_request(&self, message: &WireMessage, request: ClientRequest) -> crate::Result<()> {
        log::trace!(
            "Received '{}' on {} socket",
            message.header.msg_type,
            self.socket.name
        );

        let callbacks = KernelCallbacks::new(
            self.iopub.clone(),
            self.stdin.clone(),
            message.header.clone(),
            message.zmq_identities.clone(),
            self.shutdown.clone(),
        );

        // Execution requests (and only those) are bracketed with busy/idle
        // status messages on iopub; a silent execution gets no reply.
        let bracket = matches!(&request, ClientRequest::Execute(_));
        let silent = matches!(&request, ClientRequest::Execute(req) if req.silent);

        if bracket {
            callbacks.send_output(KernelOutput::Status(KernelStatus::busy()))?;
        }

        let result = self.handler.handle_request(&callbacks, request);

        let outcome = match result {
            Ok(_) if silent => Ok(()),
            Ok(reply) => self.send_reply(message, &reply),
            Err(err) => Err(err),
        };

        // Return to idle even when the handler failed; frontends will not
        // submit further work until the kernel is marked idle.
        if bracket {
            callbacks.send_output(KernelOutput::Status(KernelStatus::idle()))?;
        }

        outcome
    }

    fn handle_comm(&self, message: &WireMessage, comm: Comm) -> crate::Result<()> {
        log::trace!(
            "Received '{}' on {} socket",
            message.header.msg_type,
            self.socket.name
        );

        let callbacks = KernelCallbacks::new(
            self.iopub.clone(),
            self.stdin.clone(),
            message.header.clone(),
            message.zmq_identities.clone(),
            self.shutdown.clone(),
        );

        self.handler.handle_comm(&callbacks, comm)
    }

    /// Send the handler's reply back on the request socket, parented to the
    /// request and routed with its identities.
    fn send_reply(&self, message: &WireMessage, reply: &KernelReply) -> crate::Result<()> {
        let wire = WireMessage::create(
            message.header.reply(reply.message_type()),
            Some(message.header.clone()),
            message.zmq_identities.clone(),
            reply.to_content()?,
        );
        wire.send(&self.socket)
    }
}
