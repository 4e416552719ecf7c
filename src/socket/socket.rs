/*
 * socket.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use log::trace;

use crate::error::Error;
use crate::session::Session;

/// How long a worker waits on a socket before rechecking the engine's
/// shutdown flag, in milliseconds.
pub(crate) const POLL_INTERVAL_MS: i64 = 100;

/// Represents a socket that sends and receives messages that are optionally
/// signed with a SHA-256 HMAC.
pub struct Socket {
    /// The Jupyter session information associated with the socket, including
    /// the session ID and HMAC signing key
    pub session: Session,

    /// The name of the socket; used only to give context to debugging/trace
    /// messages
    pub name: String,

    /// A ZeroMQ socket over which signed messages are to be sent/received
    pub socket: zmq::Socket,
}

impl Socket {
    /// Create a new Socket instance from a kernel session and a ZeroMQ context.
    ///
    /// The socket kind decides which side of the connection this is: ROUTER,
    /// PUB and REP sockets bind to the endpoint (the kernel side); DEALER,
    /// SUB and REQ sockets connect to it (the client side).
    pub fn new(
        session: Session,
        ctx: zmq::Context,
        name: String,
        kind: zmq::SocketType,
        identity: Option<&[u8]>,
        endpoint: String,
    ) -> Result<Self, Error> {
        // Create the underlying ZeroMQ socket
        let socket = match ctx.socket(kind) {
            Ok(s) => s,
            Err(err) => return Err(Error::CreateSocketFailed(name, err)),
        };

        // IOPub is the high-traffic socket, so raise its send high water mark
        // from the default of 1k messages to avoid dropping outputs when a
        // subscriber is slow. This has to be set before the call to `bind()`.
        if name == "IOPub" {
            if let Err(err) = socket.set_sndhwm(100000) {
                return Err(Error::CreateSocketFailed(name, err));
            }
        }

        // Set the socket's identity, if supplied
        if let Some(identity) = identity {
            if let Err(err) = socket.set_identity(identity) {
                return Err(Error::CreateSocketFailed(name, err));
            }
        }

        match kind {
            zmq::SocketType::ROUTER | zmq::SocketType::PUB | zmq::SocketType::REP => {
                trace!("Binding to ZeroMQ '{}' socket at {}", name, endpoint);
                if let Err(err) = socket.bind(&endpoint) {
                    return Err(Error::SocketBindError(name, endpoint, err));
                }
            }
            zmq::SocketType::DEALER | zmq::SocketType::SUB | zmq::SocketType::REQ => {
                trace!("Connecting to ZeroMQ '{}' socket at {}", name, endpoint);
                if let Err(err) = socket.connect(&endpoint) {
                    return Err(Error::SocketConnectError(name, endpoint, err));
                }
            }
            _ => return Err(Error::UnsupportedSocketType(kind)),
        }

        // If this is a debug build, set `ZMQ_ROUTER_MANDATORY` on all `ROUTER`
        // sockets, so that we get errors instead of silent message drops for
        // unroutable messages.
        #[cfg(debug_assertions)]
        {
            if kind == zmq::ROUTER {
                if let Err(err) = socket.set_router_mandatory(true) {
                    return Err(Error::SocketBindError(name, endpoint, err));
                }
            }
        }

        Ok(Self {
            socket,
            session,
            name,
        })
    }

    /// Receive a message from the socket.
    ///
    /// **Note**: This will block until a message is delivered on the socket.
    pub fn recv(&self, msg: &mut zmq::Message) -> Result<(), Error> {
        if let Err(err) = self.socket.recv(msg, 0) {
            Err(Error::ZmqError(self.name.clone(), err))
        } else {
            Ok(())
        }
    }

    /// Receive a multi-part message from the socket.
    ///
    /// **Note**: This will block until a message is delivered on the socket.
    pub fn recv_multipart(&self) -> Result<Vec<Vec<u8>>, Error> {
        match self.socket.recv_multipart(0) {
            Ok(data) => Ok(data),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// Send a message on the socket.
    pub fn send(&self, msg: zmq::Message) -> Result<(), Error> {
        match self.socket.send(msg, 0) {
            Ok(data) => Ok(data),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// Send a multi-part message on the socket.
    pub fn send_multipart(&self, data: &Vec<Vec<u8>>) -> Result<(), Error> {
        match self.socket.send_multipart(data, 0) {
            Ok(data) => Ok(data),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// Poll the socket for incoming data, waiting up to `timeout_ms` (`-1` to
    /// block indefinitely).
    pub fn poll_incoming(&self, timeout_ms: i64) -> Result<bool, Error> {
        match self.socket.poll(zmq::PollEvents::POLLIN, timeout_ms) {
            Ok(n) => Ok(n != 0),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    pub fn has_incoming_data(&self) -> Result<bool, Error> {
        self.poll_incoming(0)
    }

    /// Subscribes a SUB socket to all the published messages from a PUB socket.
    ///
    /// Note that this needs to be called *after* the socket connection is
    /// established on both ends.
    pub fn subscribe(&self) -> Result<(), Error> {
        // All SUB sockets subscribe to all topics; in theory frontends could
        // subscribe selectively, but in practice all known Jupyter frontends
        // subscribe to everything.
        match self.socket.set_subscribe(b"") {
            Ok(_) => Ok(()),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// The port this socket is actually bound to. Used to fill in the
    /// effective connection information after binding to port 0 (in which
    /// case ZeroMQ picks a free port on our behalf).
    pub fn bound_port(&self) -> Result<u16, Error> {
        let endpoint = match self.socket.get_last_endpoint() {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(_)) | Err(_) => {
                return Err(Error::ZmqError(
                    self.name.clone(),
                    zmq::Error::EINVAL,
                ))
            }
        };

        // We've got the full address but we only want the port at the very end
        let port = match endpoint.rfind(':') {
            Some(pos) => &endpoint[(pos + 1)..],
            None => {
                return Err(Error::ZmqError(
                    self.name.clone(),
                    zmq::Error::EINVAL,
                ))
            }
        };

        match port.parse::<u16>() {
            Ok(port) => Ok(port),
            Err(_) => Err(Error::ZmqError(self.name.clone(), zmq::Error::EINVAL)),
        }
    }
}
