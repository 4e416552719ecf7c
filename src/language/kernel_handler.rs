/*
 * kernel_handler.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use crate::kernel::KernelCallbacks;
use crate::wire::jupyter_message::ClientRequest;
use crate::wire::jupyter_message::Comm;
use crate::wire::jupyter_message::KernelReply;

/// The language-provided side of a kernel. The dispatch engine owns the
/// sockets and the receive loops; it hands every decoded request or comm to
/// this handler, together with callbacks bound to the message being handled.
///
/// The shell and control channels run in parallel and invoke the handler
/// concurrently: a long execution arriving on shell must not stop the handler
/// from answering a request on control. Methods therefore take `&self`, and
/// implementations synchronize their own internal state (see the test
/// kernels, which keep theirs behind a mutex held only for state access, not
/// across a whole request).
///
/// An error returned from either method is fatal to the worker that invoked
/// it and surfaces from `Kernel::join`.
pub trait KernelHandler: Send + Sync {
    /// Handles a client request, returning the reply the engine should send
    /// back on the originating socket. The reply's type must pair with the
    /// request (e.g. an execution request is answered with an execution
    /// reply).
    ///
    /// Outputs published through `callbacks` while handling the request are
    /// parented to it automatically.
    fn handle_request(
        &self,
        callbacks: &KernelCallbacks,
        request: ClientRequest,
    ) -> crate::Result<KernelReply>;

    /// Handles comm traffic sent by a client. Comms have no replies; the
    /// handler may use `callbacks` to publish comm messages of its own.
    fn handle_comm(&self, callbacks: &KernelCallbacks, comm: Comm) -> crate::Result<()>;
}
