/*
 * heartbeat.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::trace;

use crate::socket::socket::Socket;
use crate::socket::socket::POLL_INTERVAL_MS;

/// Structure used for heartbeat messages
pub struct Heartbeat {
    socket: Socket,
    shutdown: Arc<AtomicBool>,
}

impl Heartbeat {
    /// Create a new heartbeat handler from the given heartbeat socket
    pub fn new(socket: Socket, shutdown: Arc<AtomicBool>) -> Self {
        Self { socket, shutdown }
    }

    /// Listen for heartbeats, echoing each frame back verbatim. Returns when
    /// the engine shuts down, or with an error when the socket fails.
    pub fn listen(&self) -> crate::Result<()> {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Ok(());
            }
            if !self.socket.poll_incoming(POLL_INTERVAL_MS)? {
                continue;
            }

            let msg = self.socket.recv_multipart()?;
            trace!("Heartbeat message: {:?}", msg);

            // Echo the message right back!
            self.socket.send_multipart(&msg)?;
        }
    }
}
