/*
 * client_handler.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use crate::client::ClientCallbacks;
use crate::wire::jupyter_message::ClientReply;
use crate::wire::jupyter_message::Comm;
use crate::wire::jupyter_message::KernelOutput;
use crate::wire::jupyter_message::KernelRequest;

/// The user-provided side of a client. The dispatch engine listens on the
/// iopub and stdin sockets in the background and hands every decoded message
/// to this handler, together with callbacks bound to the message being
/// handled.
///
/// An error returned from any method is fatal to the listener that invoked it
/// and surfaces on the next call into the `Client`.
pub trait ClientHandler: Send {
    /// Handles a request from the kernel for user input, returning the reply
    /// the engine sends back on the stdin socket.
    fn handle_kernel_request(
        &mut self,
        callbacks: &ClientCallbacks,
        request: KernelRequest,
    ) -> crate::Result<ClientReply>;

    /// Handles an output published by the kernel on iopub.
    fn handle_output(
        &mut self,
        callbacks: &ClientCallbacks,
        output: KernelOutput,
    ) -> crate::Result<()>;

    /// Handles comm traffic published by the kernel on iopub.
    fn handle_comm(&mut self, callbacks: &ClientCallbacks, comm: Comm) -> crate::Result<()>;
}
