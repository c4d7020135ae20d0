use canvas_sync::ExportError;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Connect(String),
    Protocol(String),
    /// The relay closed the connection before the canvas was synchronized.
    Closed,
    Script {
        line: usize,
        source: serde_json::Error,
    },
    Io(std::io::Error),
    Export(ExportError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Connect(reason) => write!(f, "cannot connect to relay: {}", reason),
            ClientError::Protocol(reason) => write!(f, "websocket error: {}", reason),
            ClientError::Closed => write!(f, "relay closed the connection"),
            ClientError::Script { line, source } => {
                write!(f, "invalid script at line {}: {}", line, source)
            }
            ClientError::Io(e) => write!(f, "{}", e),
            ClientError::Export(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

impl From<ExportError> for ClientError {
    fn from(e: ExportError) -> Self {
        ClientError::Export(e)
    }
}
