use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How messages are framed on a websocket connection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// bincode in binary frames
    Binary,
    /// serde_json in text frames
    Json,
}

impl std::default::Default for WireFormat {
    fn default() -> Self {
        WireFormat::Binary
    }
}

#[derive(Debug)]
pub enum CodecError {
    Binary(bincode::Error),
    Json(serde_json::Error),
    /// A frame arrived in the other format than the connection negotiated.
    UnexpectedFrame(WireFormat),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Binary(e) => write!(f, "bincode: {}", e),
            CodecError::Json(e) => write!(f, "json: {}", e),
            CodecError::UnexpectedFrame(expected) => {
                write!(f, "unexpected frame type, expected {:?}", expected)
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<bincode::Error> for CodecError {
    fn from(e: bincode::Error) -> Self {
        CodecError::Binary(e)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Json(e)
    }
}

/// An encoded message, ready to be put in a websocket frame of matching type.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Binary(Vec<u8>),
    Text(String),
}

impl WireFormat {
    pub fn encode<T: Serialize>(&self, message: &T) -> Result<Frame, CodecError> {
        match self {
            WireFormat::Binary => Ok(Frame::Binary(bincode::serialize(message)?)),
            WireFormat::Json => Ok(Frame::Text(serde_json::to_string(message)?)),
        }
    }

    pub fn decode_binary<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            WireFormat::Binary => Ok(bincode::deserialize(bytes)?),
            WireFormat::Json => Err(CodecError::UnexpectedFrame(*self)),
        }
    }

    pub fn decode_text<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        match self {
            WireFormat::Json => Ok(serde_json::from_str(text)?),
            WireFormat::Binary => Err(CodecError::UnexpectedFrame(*self)),
        }
    }
}
