/*
 * error.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use std::fmt;

#[derive(Debug)]
pub enum Error {
    CreateSocketFailed(String, zmq::Error),
    SocketBindError(String, String, zmq::Error),
    SocketConnectError(String, String, zmq::Error),
    UnsupportedSocketType(zmq::SocketType),
    ZmqError(String, zmq::Error),
    MissingDelimiter,
    InsufficientParts(usize, usize),
    InvalidHmac(Vec<u8>, hex::FromHexError),
    BadSignature(Vec<u8>, hmac::digest::MacError),
    Utf8Error(String, Vec<u8>, std::str::Utf8Error),
    JsonParseError(String, String, serde_json::Error),
    InvalidPart(String, serde_json::Value, serde_json::Error),
    InvalidMessage(String, serde_json::Value, serde_json::Error),
    CannotSerialize(serde_json::Error),
    UnknownMessageType(String),
    HmacKeyInvalid(String, crypto_common::InvalidLength),
    UnsupportedSignatureScheme(String),
    ReadConnectionFailed(std::io::Error),
    ParseConnectionFailed(serde_json::Error),
    WriteConnectionFailed(std::io::Error),
    CreateThreadFailed(String, std::io::Error),
    HandlerError(String),
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CreateSocketFailed(name, err) => {
                write!(f, "Could not create ZeroMQ '{}' socket: {}", name, err)
            }
            Error::SocketBindError(name, endpoint, err) => {
                write!(
                    f,
                    "Could not bind ZeroMQ '{}' socket to {}: {}",
                    name, endpoint, err
                )
            }
            Error::SocketConnectError(name, endpoint, err) => {
                write!(
                    f,
                    "Could not connect ZeroMQ '{}' socket to {}: {}",
                    name, endpoint, err
                )
            }
            Error::UnsupportedSocketType(kind) => {
                write!(f, "Unsupported ZeroMQ socket type: {:?}", kind)
            }
            Error::ZmqError(name, err) => {
                write!(f, "ZeroMQ error on '{}' socket: {}", name, err)
            }
            Error::MissingDelimiter => {
                write!(
                    f,
                    "ZeroMQ message did not include expected <IDS|MSG> delimiter"
                )
            }
            Error::InsufficientParts(found, expected) => {
                write!(
                    f,
                    "ZeroMQ message did not contain sufficient parts (found {}, expected {})",
                    found, expected
                )
            }
            Error::InvalidHmac(data, err) => {
                write!(
                    f,
                    "ZeroMQ message HMAC signature {:?} is not a valid hexadecimal value: {}",
                    data, err
                )
            }
            Error::BadSignature(sig, err) => {
                write!(
                    f,
                    "ZeroMQ message HMAC signature {:?} is incorrect: {}",
                    sig, err
                )
            }
            Error::Utf8Error(part, data, err) => {
                write!(
                    f,
                    "Message part '{}' was not valid UTF-8: {} (raw: {:?})",
                    part, err, data
                )
            }
            Error::JsonParseError(part, str, err) => {
                write!(
                    f,
                    "Message part '{}' is invalid JSON: {} (raw: {})",
                    part, err, str
                )
            }
            Error::InvalidPart(part, json, err) => {
                write!(
                    f,
                    "Message part '{}' does not match schema: {} (raw: {})",
                    part, err, json
                )
            }
            Error::InvalidMessage(kind, json, err) => {
                write!(f, "Invalid '{}' message: {} (raw: {})", kind, err, json)
            }
            Error::CannotSerialize(err) => {
                write!(f, "Cannot serialize message: {}", err)
            }
            Error::UnknownMessageType(kind) => {
                write!(f, "Unknown message type '{}'", kind)
            }
            Error::HmacKeyInvalid(key, err) => {
                write!(
                    f,
                    "The supplied HMAC signing key ({} bytes) cannot be used: {}",
                    key.len(),
                    err
                )
            }
            Error::UnsupportedSignatureScheme(scheme) => {
                write!(
                    f,
                    "Unsupported signature scheme '{}' (only hmac-sha256 is supported)",
                    scheme
                )
            }
            Error::ReadConnectionFailed(err) => {
                write!(f, "Could not read connection file: {}", err)
            }
            Error::ParseConnectionFailed(err) => {
                write!(f, "Could not parse connection file: {}", err)
            }
            Error::WriteConnectionFailed(err) => {
                write!(f, "Could not write connection file: {}", err)
            }
            Error::CreateThreadFailed(name, err) => {
                write!(f, "Could not spawn '{}' thread: {}", name, err)
            }
            Error::HandlerError(detail) => {
                write!(f, "Handler error: {}", detail)
            }
            Error::Cancelled => {
                write!(f, "Operation cancelled by engine shutdown")
            }
        }
    }
}

impl std::error::Error for Error {}
