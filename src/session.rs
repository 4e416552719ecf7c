/*
 * session.rs
 *
 * Copyright (C) 2022 Posit Software, PBC. All rights reserved.
 *
 */

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;

use crate::error::Error;
use crate::wire::header::new_uuid;

/// The username attached to message headers when the caller does not supply
/// one.
pub const DEFAULT_USERNAME: &str = "default-username";

/// A Jupyter session: the identity under which messages are created, plus the
/// HMAC key used to sign them. `hmac` is `None` when the connection key is
/// empty, which disables signing and verification entirely.
#[derive(Clone)]
pub struct Session {
    pub hmac: Option<Hmac<Sha256>>,
    pub username: String,
    pub session_id: String,
}

impl Session {
    /// Create a new session with the default username from a signing key; an
    /// empty key disables signing.
    pub fn create(key: &str) -> Result<Self, Error> {
        Self::with_username(key, String::from(DEFAULT_USERNAME))
    }

    pub fn with_username(key: &str, username: String) -> Result<Self, Error> {
        let hmac = match key.len() {
            0 => None,
            _ => match Hmac::<Sha256>::new_from_slice(key.as_bytes()) {
                Ok(hmac) => Some(hmac),
                Err(err) => return Err(Error::HmacKeyInvalid(key.to_string(), err)),
            },
        };
        Ok(Self {
            hmac,
            username,
            session_id: new_uuid(),
        })
    }
}
