use crate::admin::SessionDescription;
use canvas_sync::{ConnectionId, OperationHistory, SessionId};

pub struct Session {
    pub session_id: SessionId,
    pub connections: Vec<ConnectionId>,
    pub history: OperationHistory,
}

impl Session {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            connections: Vec::new(),
            history: OperationHistory::new(),
        }
    }

    pub fn describe(&self) -> SessionDescription {
        SessionDescription {
            session_id: self.session_id,
            connections: self.connections.len(),
            history_length: self.history.len(),
        }
    }
}
