//! Credential transport encoding.
//!
//! How credentials travel to the status endpoint belongs to the session
//! layer of the console, not to the telemetry engine. The engine only asks
//! an encoder to turn each device's credentials into a wire string.

use std::fmt::Debug;

use crate::data::Credentials;

/// Turns device credentials into the form sent with a fetch request.
pub trait CredentialEncoding: Send + Sync + Debug {
    fn encode(&self, credentials: &Credentials) -> String;
}

/// Sends credentials as-is; the transport (TLS) is the protection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainEncoding;

impl CredentialEncoding for PlainEncoding {
    fn encode(&self, credentials: &Credentials) -> String {
        credentials.expose().to_string()
    }
}
