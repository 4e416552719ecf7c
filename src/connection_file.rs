/*
 * connection_file.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;

/// The only signature scheme honored on connection files.
pub const SIGNATURE_SCHEME: &str = "hmac-sha256";

/// The transport over which the five channel sockets are carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Ipc,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Transport::Tcp => write!(f, "tcp"),
            Transport::Ipc => write!(f, "ipc"),
        }
    }
}

/// The connection descriptor shared between a kernel and its clients,
/// bit-compatible with the JSON connection files Jupyter frontends write.
///
/// A port of `0` asks the kernel to bind to an OS-assigned port; the actual
/// port is read back into the effective descriptor before the kernel starts
/// serving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionFile {
    // ZeroMQ ports
    pub control_port: u16,
    pub shell_port: u16,
    pub stdin_port: u16,
    pub iopub_port: u16,
    pub hb_port: u16,

    pub transport: Transport,

    /// The signing scheme; only "hmac-sha256" is honored
    pub signature_scheme: String,

    pub ip: String,
    pub key: String,
}

impl ConnectionFile {
    /// Create a ConnectionFile by parsing the contents of a connection file.
    pub fn from_file<P: AsRef<Path>>(connection_file: P) -> Result<ConnectionFile, Error> {
        let file = File::open(connection_file).map_err(Error::ReadConnectionFailed)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(Error::ParseConnectionFailed)
    }

    /// Write the descriptor out in the JSON form frontends expect. Kernels
    /// bound to dynamic ports use this to advertise the effective ports.
    pub fn to_file<P: AsRef<Path>>(&self, connection_file: P) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(self).map_err(Error::CannotSerialize)?;
        std::fs::write(connection_file, contents).map_err(Error::WriteConnectionFailed)
    }

    /// A descriptor with every port unassigned; binding resolves the real
    /// ports.
    pub fn dynamic(ip: &str, key: &str) -> ConnectionFile {
        ConnectionFile {
            control_port: 0,
            shell_port: 0,
            stdin_port: 0,
            iopub_port: 0,
            hb_port: 0,
            transport: Transport::Tcp,
            signature_scheme: String::from(SIGNATURE_SCHEME),
            ip: String::from(ip),
            key: String::from(key),
        }
    }

    /// Given a port, return a URI-like string that can be used to connect to
    /// the port, given the other parameters in the connection file.
    ///
    /// Example: `32` => `"tcp://127.0.0.1:32"`
    pub fn endpoint(&self, port: u16) -> String {
        match self.transport {
            Transport::Tcp => format!("{}://{}:{}", self.transport, self.ip, port),
            Transport::Ipc => format!("{}://{}-{}", self.transport, self.ip, port),
        }
    }

    /// Signature schemes other than HMAC-SHA-256 are rejected before any
    /// socket is opened.
    pub fn validate_signature_scheme(&self) -> Result<(), Error> {
        if self.signature_scheme == SIGNATURE_SCHEME {
            Ok(())
        } else {
            Err(Error::UnsupportedSignatureScheme(
                self.signature_scheme.clone(),
            ))
        }
    }
}
