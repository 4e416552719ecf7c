/*
 * wire.rs
 *
 * Copyright (C) 2022-2024 Posit Software, PBC. All rights reserved.
 *
 */

use serde_json::json;
use themisto::connection_file::ConnectionFile;
use themisto::error::Error;
use themisto::session::Session;
use themisto::wire::comm_info_reply::CommInfoReply;
use themisto::wire::comm_msg::CommMsg;
use themisto::wire::comm_open::CommOpen;
use themisto::wire::complete_reply::CompleteReply;
use themisto::wire::display_data::DisplayData;
use themisto::wire::display_data::MimeType;
use themisto::wire::exception::Exception;
use themisto::wire::execute_reply::ExecuteReply;
use themisto::wire::execute_request::ExecuteRequest;
use themisto::wire::header::new_uuid;
use themisto::wire::header::JupyterHeader;
use themisto::wire::history_reply::HistoryEntry;
use themisto::wire::history_reply::HistoryReply;
use themisto::wire::history_request::HistoryAccessType;
use themisto::wire::history_request::HistoryRequest;
use themisto::wire::input_reply::InputReply;
use themisto::wire::input_request::InputRequest;
use themisto::wire::inspect_reply::InspectReply;
use themisto::wire::inspect_request::DetailLevel;
use themisto::wire::inspect_request::InspectRequest;
use themisto::wire::is_complete_reply::IsCompleteReply;
use themisto::wire::jupyter_message::ClientReply;
use themisto::wire::jupyter_message::ClientRequest;
use themisto::wire::jupyter_message::Comm;
use themisto::wire::jupyter_message::JupyterMessage;
use themisto::wire::jupyter_message::KernelOutput;
use themisto::wire::jupyter_message::KernelReply;
use themisto::wire::jupyter_message::KernelRequest;
use themisto::wire::kernel_info_reply::KernelInfoReply;
use themisto::wire::shutdown_request::ShutdownRequest;
use themisto::wire::status::KernelStatus;
use themisto::wire::stream::Stream;
use themisto::wire::stream::StreamOutput;
use themisto::wire::wire_message::WireMessage;

/// Encode a message the way the engines do: fresh header, content from the
/// family encoder; then decode it back through the family decoder.
fn roundtrip_request(request: &ClientRequest) -> ClientRequest {
    let header = JupyterHeader::create(
        request.message_type(),
        String::from("session"),
        String::from("tester"),
    );
    let wire = WireMessage::create(header, None, Vec::new(), request.to_content().unwrap());
    ClientRequest::try_from(&wire).unwrap()
}

fn roundtrip_reply(reply: &KernelReply) -> KernelReply {
    let header = JupyterHeader::create(
        reply.message_type(),
        String::from("session"),
        String::from("tester"),
    );
    let wire = WireMessage::create(header, None, Vec::new(), reply.to_content().unwrap());
    KernelReply::try_from(&wire).unwrap()
}

fn roundtrip_output(output: &KernelOutput) -> KernelOutput {
    let header = JupyterHeader::create(
        output.message_type(),
        String::from("session"),
        String::from("tester"),
    );
    let wire = WireMessage::create(header, None, Vec::new(), output.to_content().unwrap());
    KernelOutput::try_from(&wire).unwrap()
}

#[test]
fn test_is_complete_reply_encoding() {
    let reply = IsCompleteReply::Incomplete {
        indent: String::from("    "),
    };
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({"status": "incomplete", "indent": "    "})
    );

    let reply = IsCompleteReply::Complete;
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({"status": "complete"})
    );
}

#[test]
fn test_history_range_encoding() {
    let request = HistoryRequest {
        output: true,
        raw: true,
        access: HistoryAccessType::Range {
            session: -1,
            start: 10,
            stop: 100,
        },
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "hist_access_type": "range",
            "session": -1,
            "start": 10,
            "stop": 100,
            "output": true,
            "raw": true
        })
    );
}

#[test]
fn test_history_tail_and_search_encoding() {
    let request = HistoryRequest {
        output: false,
        raw: true,
        access: HistoryAccessType::Tail { n: 5 },
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["hist_access_type"], json!("tail"));
    assert_eq!(value["n"], json!(5));

    let request = HistoryRequest {
        output: false,
        raw: false,
        access: HistoryAccessType::Search {
            pattern: String::from("import *"),
            unique: true,
        },
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["hist_access_type"], json!("search"));
    assert_eq!(value["pattern"], json!("import *"));
    assert_eq!(value["unique"], json!(true));
}

#[test]
fn test_history_entry_encoding() {
    let entry = HistoryEntry {
        session: 1,
        line: 2,
        input: String::from("1 + 1"),
        output: None,
    };
    assert_eq!(serde_json::to_value(&entry).unwrap(), json!([1, 2, "1 + 1"]));

    let entry = HistoryEntry {
        session: 1,
        line: 2,
        input: String::from("1 + 1"),
        output: Some(String::from("2")),
    };
    assert_eq!(
        serde_json::to_value(&entry).unwrap(),
        json!([1, 2, ["1 + 1", "2"]])
    );
}

#[test]
fn test_detail_level_encoding() {
    let request = InspectRequest {
        code: String::from("print"),
        cursor_pos: 5,
        detail_level: DetailLevel::Low,
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap()["detail_level"],
        json!(0)
    );

    let request = InspectRequest {
        detail_level: DetailLevel::High,
        ..request
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap()["detail_level"],
        json!(1)
    );
}

#[test]
fn test_restart_is_boolean() {
    let request = ShutdownRequest { restart: false };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"restart": false})
    );
}

#[test]
fn test_execute_request_emits_empty_user_expressions() {
    let request = ExecuteRequest::new(String::from("1 + 1"));
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["user_expressions"], json!({}));
}

#[test]
fn test_operation_result_encoding() {
    assert_eq!(
        serde_json::to_value(ExecuteReply::ok(3)).unwrap(),
        json!({"status": "ok", "execution_count": 3, "user_expressions": {}})
    );

    let exception = Exception {
        ename: String::from("ValueError"),
        evalue: String::from("bad value"),
        traceback: vec![String::from("line 1")],
    };
    assert_eq!(
        serde_json::to_value(ExecuteReply::error(exception)).unwrap(),
        json!({
            "status": "error",
            "ename": "ValueError",
            "evalue": "bad value",
            "traceback": ["line 1"]
        })
    );

    assert_eq!(
        serde_json::to_value(ExecuteReply::abort()).unwrap(),
        json!({"status": "abort"})
    );
}

#[test]
fn test_inspect_not_found_encoding() {
    // The empty case emits found: false alongside empty data and metadata
    assert_eq!(
        serde_json::to_value(InspectReply::not_found()).unwrap(),
        json!({"status": "ok", "found": false, "data": {}, "metadata": {}})
    );
}

#[test]
fn test_display_data_encoding() {
    let display = DisplayData::text("a plot")
        .with(
            MimeType::Png {
                width: 640,
                height: 480,
            },
            "aGVsbG8=",
        );
    assert_eq!(
        serde_json::to_value(&display).unwrap(),
        json!({
            "data": {
                "text/plain": "a plot",
                "image/png": "aGVsbG8="
            },
            "metadata": {
                "image/png": { "width": 640, "height": 480 }
            }
        })
    );
}

#[test]
fn test_kernel_info_simple_encoding() {
    // The minimal info reply a basic kernel sends
    assert_eq!(
        serde_json::to_value(KernelInfoReply::simple("Basic")).unwrap(),
        json!({
            "banner": "",
            "help_links": [],
            "implementation": "Basic",
            "implementation_version": "0.0",
            "language_info": {
                "file_extension": ".txt",
                "mimetype": "text/plain",
                "name": "Basic",
                "version": "0.0"
            },
            "protocol_version": "5.0"
        })
    );
}

#[test]
fn test_comm_info_reply_encoding() {
    let reply = CommInfoReply::from_comms(vec![(
        String::from("4e1b3a1d3f6a4a0bb4b2a8f0d4b9a111"),
        String::from("echo"),
    )]);
    assert_eq!(
        serde_json::to_value(&reply).unwrap(),
        json!({
            "status": "ok",
            "comms": {
                "4e1b3a1d3f6a4a0bb4b2a8f0d4b9a111": { "target_name": "echo" }
            }
        })
    );
}

#[test]
fn test_request_roundtrips() {
    let requests = vec![
        ClientRequest::Execute(ExecuteRequest::new(String::from("1 + 1"))),
        ClientRequest::Inspect(InspectRequest {
            code: String::from("print"),
            cursor_pos: 3,
            detail_level: DetailLevel::High,
        }),
        ClientRequest::History(HistoryRequest {
            output: true,
            raw: false,
            access: HistoryAccessType::Search {
                pattern: String::from("x*"),
                unique: false,
            },
        }),
        ClientRequest::CommInfo(themisto::wire::comm_info_request::CommInfoRequest {
            target_name: Some(String::from("echo")),
        }),
        ClientRequest::KernelInfo(themisto::wire::kernel_info_request::KernelInfoRequest {}),
        ClientRequest::IsComplete(themisto::wire::is_complete_request::IsCompleteRequest {
            code: String::from("for x in"),
        }),
        ClientRequest::Connect(themisto::wire::connect_request::ConnectRequest {}),
        ClientRequest::Complete(themisto::wire::complete_request::CompleteRequest {
            code: String::from("pri"),
            cursor_pos: 3,
        }),
        ClientRequest::Shutdown(ShutdownRequest { restart: true }),
    ];
    for request in requests {
        assert_eq!(roundtrip_request(&request), request);
    }
}

#[test]
fn test_reply_roundtrips() {
    let replies = vec![
        KernelReply::Execute(ExecuteReply::ok(1)),
        KernelReply::Execute(ExecuteReply::abort()),
        KernelReply::Inspect(InspectReply::found(DisplayData::text("a value"))),
        KernelReply::History(HistoryReply {
            history: vec![HistoryEntry {
                session: 0,
                line: 1,
                input: String::from("1 + 1"),
                output: Some(String::from("2")),
            }],
        }),
        KernelReply::Complete(CompleteReply::ok(
            vec![String::from("print"), String::from("printf")],
            0,
            3,
        )),
        KernelReply::IsComplete(IsCompleteReply::Invalid),
        KernelReply::Connect(themisto::wire::connect_reply::ConnectReply {
            shell_port: 1,
            iopub_port: 2,
            stdin_port: 3,
            hb_port: 4,
        }),
        KernelReply::CommInfo(CommInfoReply::from_comms(vec![])),
        KernelReply::KernelInfo(KernelInfoReply::simple("Test")),
        KernelReply::Shutdown(themisto::wire::shutdown_reply::ShutdownReply { restart: false }),
    ];
    for reply in replies {
        assert_eq!(roundtrip_reply(&reply), reply);
    }
}

#[test]
fn test_output_roundtrips() {
    let outputs = vec![
        KernelOutput::Stream(StreamOutput {
            name: Stream::Stderr,
            text: String::from("oops"),
        }),
        KernelOutput::DisplayData(DisplayData::text("hello").with(
            MimeType::Jpeg {
                width: 32,
                height: 32,
            },
            "Zm9v",
        )),
        KernelOutput::ExecuteInput(themisto::wire::execute_input::ExecuteInput {
            code: String::from("1 + 1"),
            execution_count: 7,
        }),
        KernelOutput::ExecuteResult(themisto::wire::execute_result::ExecuteResult {
            execution_count: 7,
            display: DisplayData::text("2"),
        }),
        KernelOutput::ExecuteError(themisto::wire::execute_error::ExecuteError {
            exception: Exception::internal_error(String::from("oh no")),
        }),
        KernelOutput::Status(KernelStatus::busy()),
        KernelOutput::ClearOutput(themisto::wire::clear_output::ClearOutput { wait: true }),
    ];
    for output in outputs {
        assert_eq!(roundtrip_output(&output), output);
    }
}

#[test]
fn test_stdin_and_comm_roundtrips() {
    let request = KernelRequest::Input(InputRequest {
        prompt: String::from("password: "),
        password: true,
    });
    let header = JupyterHeader::create(
        request.message_type(),
        String::from("session"),
        String::from("tester"),
    );
    let wire = WireMessage::create(header, None, Vec::new(), request.to_content().unwrap());
    assert_eq!(KernelRequest::try_from(&wire).unwrap(), request);

    let reply = ClientReply::Input(InputReply {
        value: String::from("hunter2"),
    });
    let header = JupyterHeader::create(
        reply.message_type(),
        String::from("session"),
        String::from("tester"),
    );
    let wire = WireMessage::create(header, None, Vec::new(), reply.to_content().unwrap());
    assert_eq!(ClientReply::try_from(&wire).unwrap(), reply);

    let comms = vec![
        Comm::Open(CommOpen {
            comm_id: String::from("5d0f"),
            target_name: String::from("echo"),
            target_module: None,
            data: json!({"hello": true}),
        }),
        Comm::Msg(CommMsg {
            comm_id: String::from("5d0f"),
            data: json!({"n": 1}),
        }),
        Comm::Close(themisto::wire::comm_close::CommClose {
            comm_id: String::from("5d0f"),
            data: json!({}),
        }),
    ];
    for comm in comms {
        let header = JupyterHeader::create(
            comm.message_type(),
            String::from("session"),
            String::from("tester"),
        );
        let wire = WireMessage::create(header, None, Vec::new(), comm.to_content().unwrap());
        assert_eq!(Comm::try_from(&wire).unwrap(), comm);
    }
}

#[test]
fn test_unknown_message_type() {
    let header = JupyterHeader::create(
        String::from("flux_capacitor_request"),
        String::from("session"),
        String::from("tester"),
    );
    let wire = WireMessage::create(header, None, Vec::new(), json!({}));
    assert!(matches!(
        ClientRequest::try_from(&wire),
        Err(Error::UnknownMessageType(_))
    ));
}

/// Build the five signed frames for a message the way the sending side does.
fn signed_frames(session: &Session, header: &JupyterHeader, content: serde_json::Value) -> Vec<Vec<u8>> {
    use hmac::Mac;

    let parts = vec![
        serde_json::to_vec(header).unwrap(),
        b"{}".to_vec(),
        b"{}".to_vec(),
        serde_json::to_vec(&content).unwrap(),
    ];

    let mut signer = session.hmac.clone().unwrap();
    for part in &parts {
        signer.update(part);
    }
    let signature = hex::encode(signer.finalize().into_bytes());

    let mut frames = vec![signature.into_bytes()];
    frames.extend(parts);
    frames
}

#[test]
fn test_typed_message_roundtrip() {
    let session = Session::create("").unwrap();
    let message = JupyterMessage::create(ExecuteRequest::new(String::from("1 + 1")), None, &session);

    assert_eq!(message.header.msg_type, "execute_request");
    assert_eq!(message.header.session, session.session_id);
    assert_eq!(message.header.username, "default-username");

    let wire = WireMessage::try_from(&message).unwrap();
    let decoded = JupyterMessage::<ExecuteRequest>::try_from(&wire).unwrap();
    assert_eq!(decoded.content, message.content);
}

#[test]
fn test_reply_header_copies_identity() {
    let request = JupyterHeader::create(
        String::from("execute_request"),
        String::from("a-session"),
        String::from("a-user"),
    );

    let reply = request.reply(String::from("execute_reply"));
    assert_eq!(reply.msg_type, "execute_reply");
    assert_eq!(reply.session, request.session);
    assert_eq!(reply.username, request.username);
    assert_ne!(reply.msg_id, request.msg_id);
}

#[test]
fn test_uuid_canonical_form() {
    let id = new_uuid();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_connection_file_roundtrip() {
    let mut connection_file = ConnectionFile::dynamic("127.0.0.1", "secret");
    connection_file.shell_port = 4001;
    connection_file.hb_port = 4005;

    let path = std::env::temp_dir().join(format!("connection-{}.json", new_uuid()));
    connection_file.to_file(&path).unwrap();
    let read_back = ConnectionFile::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(read_back.shell_port, 4001);
    assert_eq!(read_back.hb_port, 4005);
    assert_eq!(read_back.ip, "127.0.0.1");
    assert_eq!(read_back.key, "secret");
    assert_eq!(read_back.signature_scheme, "hmac-sha256");
}

#[test]
fn test_unsupported_signature_scheme_rejected() {
    let mut connection_file = ConnectionFile::dynamic("127.0.0.1", "secret");
    connection_file.signature_scheme = String::from("hmac-md5");
    assert!(matches!(
        connection_file.validate_signature_scheme(),
        Err(Error::UnsupportedSignatureScheme(_))
    ));
}

#[test]
fn test_signature_idempotence() {
    let session = Session::create("0123456789abcdef").unwrap();
    let header = JupyterHeader::create(
        String::from("kernel_info_request"),
        session.session_id.clone(),
        session.username.clone(),
    );

    // Re-signing the unmodified quadruple yields the same signature
    let first = signed_frames(&session, &header, json!({}));
    let second = signed_frames(&session, &header, json!({}));
    assert_eq!(first[0], second[0]);
}

#[test]
fn test_signature_verification() {
    let session = Session::create("0123456789abcdef").unwrap();
    let header = JupyterHeader::create(
        String::from("kernel_info_request"),
        session.session_id.clone(),
        session.username.clone(),
    );

    let mut frames = vec![b"<IDS|MSG>".to_vec()];
    frames.extend(signed_frames(&session, &header, json!({})));

    // An untampered message parses
    let message = WireMessage::from_buffers(frames.clone(), &session.hmac).unwrap();
    assert_eq!(message.header.msg_type, "kernel_info_request");

    // Tampering with the content after signing trips verification
    let last = frames.len() - 1;
    frames[last] = b"{\"tampered\":true}".to_vec();
    assert!(matches!(
        WireMessage::from_buffers(frames, &session.hmac),
        Err(Error::BadSignature(..))
    ));
}
