/*
 * kernel.rs
 *
 * Copyright (C) 2022-2024 Posit Software, PBC. All rights reserved.
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
use crate::language::kernel_handler::KernelHandler;
use crate::session::Session;
use crate::socket::heartbeat::Heartbeat;
use crate::socket::router::Router;
use crate::socket::socket::Socket;
use crate::socket::socket::POLL_INTERVAL_MS;
use crate::wire::header::JupyterHeader;
use crate::wire::jupyter_message::ClientReply;
use crate::wire::jupyter_message::Comm;
use crate::wire::jupyter_message::KernelOutput;
use crate::wire::jupyter_message::KernelRequest;
use crate::wire::wire_message::WireMessage;

/// The kernel dispatch engine. Binds the five channel sockets, spawns the
/// worker threads (heartbeat echo plus one request router each for the shell
/// and control sockets), and hands every decoded message to the
/// language-provided handler.
///
/// Workers run until `shutdown` is called or one of them fails; the first
/// fatal worker error is surfaced by `join`, which cancels the surviving
/// workers before returning it.
pub struct Kernel {
    /// The effective connection information: ports requested as 0 have been
    /// replaced with the ports the sockets are actually bound to
    connection_file: ConnectionFile,

    shutdown: Arc<AtomicBool>,
    error_rx: Receiver<Error>,
    workers: Vec<JoinHandle<()>>,
}

impl Kernel {
    /// Bind the kernel's sockets per the connection information and start
    /// serving requests with the given handler. Returns once all workers are
    /// running; the effective ports are available from `connection_file`.
    pub fn start(
        name: &str,
        connection_file: ConnectionFile,
        handler: Arc<dyn KernelHandler>,
    ) -> crate::Result<Kernel> {
        connection_file.validate_signature_scheme()?;

        let ctx = zmq::Context::new();
        let session = Session::create(connection_file.key.as_str())?;
        let mut connection_file = connection_file;

        // Create the Shell ROUTER socket on which most requests arrive.
        let shell_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Shell"),
            zmq::ROUTER,
            None,
            connection_file.endpoint(connection_file.shell_port),
        )?;
        connection_file.shell_port = port_finalize(&shell_socket, connection_file.shell_port)?;

        // Create the Control ROUTER socket; it serves the same requests as
        // Shell on a channel that stays responsive during long executions.
        let control_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Control"),
            zmq::ROUTER,
            None,
            connection_file.endpoint(connection_file.control_port),
        )?;
        connection_file.control_port =
            port_finalize(&control_socket, connection_file.control_port)?;

        // Create the IOPub PUB socket. It has no receive loop on the kernel
        // side; request handlers publish outputs on it through their
        // callbacks, so it sits behind a mutex shared by the router threads.
        let iopub_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("IOPub"),
            zmq::PUB,
            None,
            connection_file.endpoint(connection_file.iopub_port),
        )?;
        connection_file.iopub_port = port_finalize(&iopub_socket, connection_file.iopub_port)?;
        let iopub = Arc::new(Mutex::new(iopub_socket));

        // Create the Stdin ROUTER socket. Like IOPub it has no standing
        // receive loop: a handler that needs input performs a synchronous
        // round-trip on it, serialized by the mutex.
        let stdin_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Stdin"),
            zmq::ROUTER,
            None,
            connection_file.endpoint(connection_file.stdin_port),
        )?;
        connection_file.stdin_port = port_finalize(&stdin_socket, connection_file.stdin_port)?;
        let stdin = Arc::new(Mutex::new(stdin_socket));

        // Create the heartbeat REP socket.
        let heartbeat_socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Heartbeat"),
            zmq::REP,
            None,
            connection_file.endpoint(connection_file.hb_port),
        )?;
        connection_file.hb_port = port_finalize(&heartbeat_socket, connection_file.hb_port)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let (error_tx, error_rx) = unbounded();
        let mut workers = Vec::new();

        // Start the heartbeat thread, which echoes frames back verbatim.
        let heartbeat = Heartbeat::new(heartbeat_socket, shutdown.clone());
        workers.push(spawn_worker(format!("{name}-heartbeat"), error_tx.clone(), move || {
            heartbeat.listen()
        })?);

        // Start one router thread per request socket; shell and control run
        // identical dispatch logic and invoke the handler in parallel, so a
        // long execution on shell leaves control responsive.
        for socket in [shell_socket, control_socket] {
            let router = Router::new(
                socket,
                iopub.clone(),
                stdin.clone(),
                handler.clone(),
                shutdown.clone(),
            );
            let thread_name = format!("{name}-{}", router.name().to_lowercase());
            workers.push(spawn_worker(thread_name, error_tx.clone(), move || {
                router.listen()
            })?);
        }

        Ok(Kernel {
            connection_file,
            shutdown,
            error_rx,
            workers,
        })
    }

    /// The effective connection information for this kernel, with all dynamic
    /// ports resolved. Suitable for writing out with
    /// `ConnectionFile::to_file` for frontends to discover.
    pub fn connection_file(&self) -> &ConnectionFile {
        &self.connection_file
    }

    /// Block until a worker fails, then cancel the remaining workers and
    /// return the failure. Returns `Ok(())` if the engine is shut down from
    /// another thread instead.
    pub fn join(self) -> crate::Result<()> {
        let result = match self.error_rx.recv() {
            Ok(err) => Err(err),
            // All workers exited cleanly and dropped their senders
            Err(_) => Ok(()),
        };
        self.stop_workers();
        result
    }

    /// Cancel all workers and wait for them to exit.
    pub fn shutdown(self) -> crate::Result<()> {
        let pending = self.error_rx.try_recv().ok();
        self.stop_workers();
        match pending {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stop_workers(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for worker in self.workers {
            if worker.join().is_err() {
                log::error!("A kernel worker thread panicked during shutdown");
            }
        }
    }
}

/// Callbacks handed to the kernel handler, bound to the inbound message being
/// handled. Everything sent through them is parented to that message.
pub struct KernelCallbacks {
    iopub: Arc<Mutex<Socket>>,
    stdin: Arc<Mutex<Socket>>,
    parent: JupyterHeader,
    zmq_identities: Vec<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
}

impl KernelCallbacks {
    pub(crate) fn new(
        iopub: Arc<Mutex<Socket>>,
        stdin: Arc<Mutex<Socket>>,
        parent: JupyterHeader,
        zmq_identities: Vec<Vec<u8>>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            iopub,
            stdin,
            parent,
            zmq_identities,
            shutdown,
        }
    }

    /// The header of the message being handled.
    pub fn parent(&self) -> &JupyterHeader {
        &self.parent
    }

    /// Publish an output on iopub, parented to the message being handled.
    pub fn send_output(&self, output: KernelOutput) -> crate::Result<()> {
        let content = output.to_content()?;
        let socket = self.iopub.lock().unwrap();
        let msg = WireMessage::create(
            self.parent.reply(output.message_type()),
            Some(self.parent.clone()),
            Vec::new(),
            content,
        );
        msg.send(&socket)
    }

    /// Publish comm traffic on iopub, parented to the message being handled.
    pub fn send_comm(&self, comm: Comm) -> crate::Result<()> {
        let content = comm.to_content()?;
        let socket = self.iopub.lock().unwrap();
        let msg = WireMessage::create(
            self.parent.reply(comm.message_type()),
            Some(self.parent.clone()),
            Vec::new(),
            content,
        );
        msg.send(&socket)
    }

    /// Send a request to the client on the stdin socket and block until the
    /// matching reply arrives. The stdin mutex is held for the whole round
    /// trip, so concurrent handlers take turns; a shutdown while waiting
    /// aborts the wait with `Error::Cancelled`.
    pub fn send_request(&self, request: KernelRequest) -> crate::Result<ClientReply> {
        let content = request.to_content()?;
        let socket = self.stdin.lock().unwrap();

        // Route to the requesting peer: the client's stdin socket shares its
        // ZeroMQ identity with its shell socket.
        let msg = WireMessage::create(
            self.parent.reply(request.message_type()),
            Some(self.parent.clone()),
            self.zmq_identities.clone(),
            content,
        );
        msg.send(&socket)?;

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Err(Error::Cancelled);
            }
            if !socket.poll_incoming(POLL_INTERVAL_MS)? {
                continue;
            }
            let reply = WireMessage::read_from_socket(&socket)?;
            return ClientReply::try_from(&reply);
        }
    }
}

/// Spawn a supervised worker thread: a fatal error from the worker is
/// forwarded to the engine's error channel, where `join` picks it up.
fn spawn_worker<F>(
    name: String,
    error_tx: Sender<Error>,
    worker: F,
) -> crate::Result<JoinHandle<()>>
where
    F: FnOnce() -> crate::Result<()> + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            if let Err(err) = worker() {
                log::error!("Worker thread failed: {err}");
                let _ = error_tx.send(err);
            }
        })
        .map_err(|err| Error::CreateThreadFailed(name, err))
}

fn port_finalize(socket: &Socket, port: u16) -> crate::Result<u16> {
    if port == 0 {
        // We asked ZeroMQ to pick a free port; read back which one it chose.
        socket.bound_port()
    } else {
        Ok(port)
    }
}
