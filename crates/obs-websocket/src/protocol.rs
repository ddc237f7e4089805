//! obs-websocket v5 wire protocol.
//!
//! Every frame is a JSON text message of the form `{"op": <u8>, "d": {...}}`.
//! Only the subset needed by a request/response client is modelled here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{ObsError, Result};

/// RPC version negotiated during Identify.
pub const RPC_VERSION: u32 = 1;

/// Message opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Hello = 0,
    Identify = 1,
    Identified = 2,
    Reidentify = 3,
    Event = 5,
    Request = 6,
    RequestResponse = 7,
    RequestBatch = 8,
    RequestBatchResponse = 9,
}

impl TryFrom<u8> for OpCode {
    type Error = ObsError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Hello,
            1 => Self::Identify,
            2 => Self::Identified,
            3 => Self::Reidentify,
            5 => Self::Event,
            6 => Self::Request,
            7 => Self::RequestResponse,
            8 => Self::RequestBatch,
            9 => Self::RequestBatchResponse,
            other => return Err(ObsError::protocol(format!("unknown opcode {other}"))),
        })
    }
}

/// Authentication challenge carried by Hello.
#[derive(Debug, Clone, Deserialize)]
pub struct Authentication {
    pub challenge: String,
    pub salt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    #[serde(default)]
    pub authentication: Option<Authentication>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<'a> {
    pub request_type: &'a str,
    pub request_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u16,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default)]
    pub response_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_type: String,
}

/// A decoded server-to-client frame.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    Hello(Hello),
    Identified(Identified),
    Event(Event),
    RequestResponse(RequestResponse),
    /// Valid opcode this client has no use for.
    Other(OpCode),
}

#[derive(Deserialize)]
struct RawEnvelope {
    op: u8,
    #[serde(default)]
    d: Value,
}

#[derive(Serialize)]
struct Envelope<T> {
    op: u8,
    d: T,
}

impl ServerMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawEnvelope = serde_json::from_str(text)
            .map_err(|e| ObsError::protocol(format!("malformed frame: {e}")))?;
        let op = OpCode::try_from(raw.op)?;

        fn data<T: serde::de::DeserializeOwned>(op: OpCode, d: Value) -> Result<T> {
            serde_json::from_value(d)
                .map_err(|e| ObsError::protocol(format!("invalid {op:?} payload: {e}")))
        }

        Ok(match op {
            OpCode::Hello => Self::Hello(data(op, raw.d)?),
            OpCode::Identified => Self::Identified(data(op, raw.d)?),
            OpCode::Event => Self::Event(data(op, raw.d)?),
            OpCode::RequestResponse => Self::RequestResponse(data(op, raw.d)?),
            other => Self::Other(other),
        })
    }
}

/// Encode a client-to-server frame.
pub fn encode<T: Serialize>(op: OpCode, payload: &T) -> Result<String> {
    Ok(serde_json::to_string(&Envelope { op: op as u8, d: payload })?)
}

/// Compute the Identify authentication string for a Hello challenge.
///
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
pub fn authentication_string(password: &str, auth: &Authentication) -> String {
    let secret = BASE64.encode(Sha256::digest(format!("{}{}", password, auth.salt)));
    BASE64.encode(Sha256::digest(format!("{}{}", secret, auth.challenge)))
}
