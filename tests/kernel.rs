/*
 * kernel.rs
 *
 * Copyright (C) 2022-2024 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Once;

use assert_matches::assert_matches;
use themisto::connection_file::ConnectionFile;
use themisto::error::Error;
use themisto::fixtures::dummy_frontend::random_key;
use themisto::fixtures::dummy_frontend::DummyFrontend;
use themisto::fixtures::dummy_frontend::ExecuteRequestOptions;
use themisto::kernel::Kernel;
use themisto::kernel::KernelCallbacks;
use themisto::language::kernel_handler::KernelHandler;
use themisto::wire::comm_info_request::CommInfoRequest;
use themisto::wire::comm_msg::CommMsg;
use themisto::wire::comm_open::CommOpen;
use themisto::wire::complete_reply::CompleteReply;
use themisto::wire::connect_reply::ConnectReply;
use themisto::wire::connect_request::ConnectRequest;
use themisto::wire::execute_reply::ExecuteReply;
use themisto::wire::header::new_uuid;
use themisto::wire::history_reply::HistoryReply;
use themisto::wire::input_reply::InputReply;
use themisto::wire::input_request::InputRequest;
use themisto::wire::inspect_reply::InspectReply;
use themisto::wire::is_complete_reply::IsCompleteReply;
use themisto::wire::jupyter_message::ClientReply;
use themisto::wire::jupyter_message::ClientRequest;
use themisto::wire::jupyter_message::Comm;
use themisto::wire::jupyter_message::KernelOutput;
use themisto::wire::jupyter_message::KernelReply;
use themisto::wire::jupyter_message::KernelRequest;
use themisto::wire::kernel_info_reply::KernelInfoReply;
use themisto::wire::kernel_info_request::KernelInfoRequest;
use themisto::wire::shutdown_reply::ShutdownReply;
use themisto::wire::shutdown_request::ShutdownRequest;
use themisto::wire::status::ExecutionState;
use themisto::wire::stream::Stream;
use themisto::wire::stream::StreamOutput;

// One-time construction of the logging system.
static INIT: Once = Once::new();
fn setup() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// A scripted kernel used to exercise the dispatch engine. The code of an
/// execution request selects a behavior: "print" emits stream output, "input"
/// performs a stdin round-trip, "boom" fails.
///
/// The engine invokes the handler concurrently from the shell and control
/// workers, so the mutable state lives behind a mutex held only while the
/// state is touched, never across a blocking callback.
struct TestKernel {
    state: Mutex<TestKernelState>,
}

struct TestKernelState {
    execution_count: u32,
    connection_file: Option<ConnectionFile>,
    open_comms: Vec<(String, String)>,
}

impl TestKernel {
    fn new() -> Self {
        Self {
            state: Mutex::new(TestKernelState {
                execution_count: 0,
                connection_file: None,
                open_comms: Vec::new(),
            }),
        }
    }

    fn set_connection_file(&self, connection_file: ConnectionFile) {
        self.state.lock().unwrap().connection_file = Some(connection_file);
    }
}

impl KernelHandler for TestKernel {
    fn handle_request(
        &self,
        callbacks: &KernelCallbacks,
        request: ClientRequest,
    ) -> themisto::Result<KernelReply> {
        match request {
            ClientRequest::Execute(request) => {
                let execution_count = {
                    let mut state = self.state.lock().unwrap();
                    state.execution_count += 1;
                    state.execution_count
                };
                match request.code.as_str() {
                    "print" => {
                        callbacks.send_output(KernelOutput::Stream(StreamOutput {
                            name: Stream::Stdout,
                            text: String::from("x"),
                        }))?;
                    }
                    "input" => {
                        let ClientReply::Input(reply) =
                            callbacks.send_request(KernelRequest::Input(InputRequest {
                                prompt: String::from("? "),
                                password: false,
                            }))?;
                        callbacks.send_output(KernelOutput::Stream(StreamOutput {
                            name: Stream::Stdout,
                            text: reply.value,
                        }))?;
                    }
                    "boom" => {
                        return Err(Error::HandlerError(String::from("the handler failed")));
                    }
                    _ => {}
                }
                Ok(KernelReply::Execute(ExecuteReply::ok(execution_count)))
            }
            ClientRequest::KernelInfo(_) => {
                Ok(KernelReply::KernelInfo(KernelInfoReply::simple("Test")))
            }
            ClientRequest::Connect(_) => {
                let state = self.state.lock().unwrap();
                let connection_file = state
                    .connection_file
                    .as_ref()
                    .expect("connection information must be set before serving connect requests");
                Ok(KernelReply::Connect(ConnectReply::from(connection_file)))
            }
            ClientRequest::IsComplete(request) => {
                Ok(KernelReply::IsComplete(if request.code.ends_with('(') {
                    IsCompleteReply::Incomplete {
                        indent: String::from("  "),
                    }
                } else {
                    IsCompleteReply::Complete
                }))
            }
            ClientRequest::CommInfo(request) => {
                let state = self.state.lock().unwrap();
                let comms = state
                    .open_comms
                    .iter()
                    .cloned()
                    .filter(|(_, target_name)| match &request.target_name {
                        Some(filter) => filter == target_name,
                        None => true,
                    })
                    .collect::<Vec<_>>();
                Ok(KernelReply::CommInfo(
                    themisto::wire::comm_info_reply::CommInfoReply::from_comms(comms),
                ))
            }
            ClientRequest::Complete(_) => Ok(KernelReply::Complete(CompleteReply::ok(
                vec![String::from("print")],
                0,
                3,
            ))),
            ClientRequest::Inspect(_) => Ok(KernelReply::Inspect(InspectReply::not_found())),
            ClientRequest::History(_) => {
                Ok(KernelReply::History(HistoryReply { history: vec![] }))
            }
            ClientRequest::Shutdown(request) => Ok(KernelReply::Shutdown(ShutdownReply {
                restart: request.restart,
            })),
        }
    }

    fn handle_comm(&self, callbacks: &KernelCallbacks, comm: Comm) -> themisto::Result<()> {
        match comm {
            Comm::Open(open) => {
                let mut state = self.state.lock().unwrap();
                state.open_comms.push((open.comm_id, open.target_name));
                Ok(())
            }
            // Echo comm messages back to the frontend over iopub
            Comm::Msg(msg) => callbacks.send_comm(Comm::Msg(msg)),
            Comm::Close(close) => {
                let mut state = self.state.lock().unwrap();
                state
                    .open_comms
                    .retain(|(comm_id, _)| comm_id != &close.comm_id);
                Ok(())
            }
        }
    }
}

fn start_kernel() -> (Kernel, DummyFrontend) {
    setup();

    let handler = Arc::new(TestKernel::new());
    let kernel = Kernel::start(
        "test",
        ConnectionFile::dynamic("127.0.0.1", &random_key()),
        handler.clone(),
    )
    .unwrap();

    // The scripted kernel needs the effective ports to answer connect
    // requests
    handler.set_connection_file(kernel.connection_file().clone());

    let frontend = DummyFrontend::connect(kernel.connection_file());
    (kernel, frontend)
}

#[test]
fn test_heartbeat_echo() {
    let (kernel, frontend) = start_kernel();

    frontend.send_heartbeat(zmq::Message::from("ping"));
    let reply = frontend.recv_heartbeat();
    assert_eq!(&*reply, b"ping");

    kernel.shutdown().unwrap();
}

#[test]
fn test_kernel_info() {
    let (kernel, frontend) = start_kernel();

    let id = frontend.send_shell(KernelInfoRequest {});
    let (message, reply) = frontend.recv_shell_reply();

    // The reply is parented to the request and paired by type tag
    assert_eq!(message.parent_header.unwrap().msg_id, id);
    assert_matches!(reply, KernelReply::KernelInfo(info) => {
        assert_eq!(info.implementation, "Test");
        assert_eq!(info.protocol_version, "5.0");
    });

    // Only execution requests are bracketed with busy/idle
    assert!(!frontend.iopub_socket.poll_incoming(300).unwrap());

    kernel.shutdown().unwrap();
}

#[test]
fn test_connect_round_trip() {
    let (kernel, frontend) = start_kernel();

    frontend.send_shell(ConnectRequest {});
    let (_, reply) = frontend.recv_shell_reply();

    let connection_file = kernel.connection_file();
    assert_matches!(reply, KernelReply::Connect(ports) => {
        assert_eq!(ports.shell_port, connection_file.shell_port);
        assert_eq!(ports.iopub_port, connection_file.iopub_port);
        assert_eq!(ports.stdin_port, connection_file.stdin_port);
        assert_eq!(ports.hb_port, connection_file.hb_port);
    });

    kernel.shutdown().unwrap();
}

#[test]
fn test_execute_status_bracketing() {
    let (kernel, frontend) = start_kernel();

    let id = frontend.send_execute_request("print", ExecuteRequestOptions::default());

    // Busy, then the stream output, then idle, each parented to the request
    let busy = frontend.assert_iopub_status(ExecutionState::Busy);
    assert_eq!(busy.parent_header.unwrap().msg_id, id);

    let (message, output) = frontend.recv_iopub_output();
    assert_eq!(message.parent_header.unwrap().msg_id, id);
    assert_matches!(output, KernelOutput::Stream(stream) => {
        assert_eq!(stream.name, Stream::Stdout);
        assert_eq!(stream.text, "x");
    });

    let idle = frontend.assert_iopub_status(ExecutionState::Idle);
    assert_eq!(idle.parent_header.unwrap().msg_id, id);

    let (message, reply) = frontend.recv_shell_reply();
    assert_eq!(message.parent_header.unwrap().msg_id, id);
    assert_matches!(reply, KernelReply::Execute(reply) => {
        assert_eq!(reply, ExecuteReply::ok(1));
    });

    kernel.shutdown().unwrap();
}

#[test]
fn test_stdin_round_trip() {
    let (kernel, frontend) = start_kernel();

    let options = ExecuteRequestOptions {
        allow_stdin: true,
        ..Default::default()
    };
    let id = frontend.send_execute_request("input", options);

    frontend.assert_iopub_status(ExecutionState::Busy);

    // The kernel requests input, parented to the execution request
    let (message, request) = frontend.recv_stdin_request();
    assert_eq!(message.parent_header.unwrap().msg_id, id);
    assert_matches!(request, KernelRequest::Input(request) => {
        assert_eq!(request.prompt, "? ");
        assert!(!request.password);
    });

    frontend.send_stdin(InputReply {
        value: String::from("42"),
    });

    // The handler echoes the input back as stream output
    let (_, output) = frontend.recv_iopub_output();
    assert_matches!(output, KernelOutput::Stream(stream) => {
        assert_eq!(stream.text, "42");
    });

    frontend.assert_iopub_status(ExecutionState::Idle);
    let (_, reply) = frontend.recv_shell_reply();
    assert_matches!(reply, KernelReply::Execute(_));

    kernel.shutdown().unwrap();
}

#[test]
fn test_control_responsive_during_execution() {
    let (kernel, frontend) = start_kernel();

    // Start an execution that blocks inside the handler waiting for a stdin
    // reply we deliberately withhold
    let options = ExecuteRequestOptions {
        allow_stdin: true,
        ..Default::default()
    };
    let execute_id = frontend.send_execute_request("input", options);
    frontend.assert_iopub_status(ExecutionState::Busy);
    let (_, request) = frontend.recv_stdin_request();
    assert_matches!(request, KernelRequest::Input(_));

    // The shell worker is now mid-handler; control must still answer
    let shutdown_id = frontend.send_control(ShutdownRequest { restart: false });
    let (message, reply) = frontend.recv_control_reply();
    assert_eq!(message.parent_header.unwrap().msg_id, shutdown_id);
    assert_matches!(reply, KernelReply::Shutdown(reply) => {
        assert!(!reply.restart);
    });

    // Unblock the execution and let it finish normally
    frontend.send_stdin(InputReply {
        value: String::from("42"),
    });
    let (_, output) = frontend.recv_iopub_output();
    assert_matches!(output, KernelOutput::Stream(stream) => {
        assert_eq!(stream.text, "42");
    });
    frontend.assert_iopub_status(ExecutionState::Idle);
    let (message, reply) = frontend.recv_shell_reply();
    assert_eq!(message.parent_header.unwrap().msg_id, execute_id);
    assert_matches!(reply, KernelReply::Execute(_));

    kernel.shutdown().unwrap();
}

#[test]
fn test_silent_execute_suppresses_reply() {
    let (kernel, frontend) = start_kernel();

    let options = ExecuteRequestOptions {
        silent: true,
        ..Default::default()
    };
    frontend.send_execute_request("print", options);

    // Still bracketed and still produces output...
    frontend.assert_iopub_status(ExecutionState::Busy);
    let (_, output) = frontend.recv_iopub_output();
    assert_matches!(output, KernelOutput::Stream(_));
    frontend.assert_iopub_status(ExecutionState::Idle);

    // ...but no reply lands on shell. (The protocol documentation calls for
    // suppressing the reply; some engines send one anyway.)
    assert!(!frontend.shell_socket.poll_incoming(300).unwrap());

    kernel.shutdown().unwrap();
}

#[test]
fn test_tampered_signature_rejected() {
    let (kernel, frontend) = start_kernel();

    let tampered_id = frontend.send_shell_tampered();
    let valid_id = frontend.send_shell(KernelInfoRequest {});

    // The only reply is to the valid request; the tampered message was
    // discarded without one
    let (message, reply) = frontend.recv_shell_reply();
    let parent = message.parent_header.unwrap();
    assert_eq!(parent.msg_id, valid_id);
    assert_ne!(parent.msg_id, tampered_id);
    assert_matches!(reply, KernelReply::KernelInfo(_));
    assert!(!frontend.shell_socket.poll_incoming(300).unwrap());

    kernel.shutdown().unwrap();
}

#[test]
fn test_comm_lifecycle() {
    let (kernel, frontend) = start_kernel();

    let comm_id = new_uuid();
    frontend.send_shell(CommOpen {
        comm_id: comm_id.clone(),
        target_name: String::from("echo"),
        target_module: None,
        data: serde_json::json!({}),
    });

    // The comm now shows up in comm info
    frontend.send_shell(CommInfoRequest { target_name: None });
    let (_, reply) = frontend.recv_shell_reply();
    assert_matches!(reply, KernelReply::CommInfo(info) => {
        assert_eq!(info.comms.len(), 1);
        assert_eq!(info.comms[&comm_id]["target_name"], "echo");
    });

    // Messages on the comm are echoed back over iopub, parented to the
    // inbound comm message
    let msg_id = frontend.send_shell(CommMsg {
        comm_id: comm_id.clone(),
        data: serde_json::json!({"value": 7}),
    });
    let (message, comm) = frontend.recv_iopub_comm();
    assert_eq!(message.parent_header.unwrap().msg_id, msg_id);
    assert_matches!(comm, Comm::Msg(msg) => {
        assert_eq!(msg.comm_id, comm_id);
        assert_eq!(msg.data["value"], 7);
    });

    // Closing removes it again
    frontend.send_shell(themisto::wire::comm_close::CommClose {
        comm_id: comm_id.clone(),
        data: serde_json::json!({}),
    });
    frontend.send_shell(CommInfoRequest { target_name: None });
    let (_, reply) = frontend.recv_shell_reply();
    assert_matches!(reply, KernelReply::CommInfo(info) => {
        assert!(info.comms.is_empty());
    });

    kernel.shutdown().unwrap();
}

#[test]
fn test_shutdown_request_not_bracketed() {
    let (kernel, frontend) = start_kernel();

    let id = frontend.send_control(ShutdownRequest { restart: true });
    let (message, reply) = frontend.recv_control_reply();

    assert_eq!(message.parent_header.unwrap().msg_id, id);
    assert_matches!(reply, KernelReply::Shutdown(reply) => {
        assert!(reply.restart);
    });

    // Shutdown requests produce no busy/idle bracketing
    assert!(!frontend.iopub_socket.poll_incoming(300).unwrap());

    kernel.shutdown().unwrap();
}

#[test]
fn test_handler_error_terminates_worker() {
    let (kernel, frontend) = start_kernel();

    frontend.send_execute_request("boom", ExecuteRequestOptions::default());

    // The bracket still closes around the failed handler, but no reply is
    // sent
    frontend.assert_iopub_status(ExecutionState::Busy);
    frontend.assert_iopub_status(ExecutionState::Idle);
    assert!(!frontend.shell_socket.poll_incoming(300).unwrap());

    // The failure surfaces from the supervisor
    let err = kernel.join().unwrap_err();
    assert_matches!(err, Error::HandlerError(detail) => {
        assert_eq!(detail, "the handler failed");
    });
}
