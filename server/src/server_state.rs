use crate::admin::SessionDescription;
use crate::session::Session;
use canvas_sync::{ConnectionId, DuplicateOperation, OperationId, SessionId};
use std::collections::HashMap;
use std::fmt;
use std::num::Wrapping;

pub struct ServerState {
    connection_id_source: Wrapping<ConnectionId>,
    connection_locations: HashMap<ConnectionId, SessionId>,
    pub sessions: HashMap<SessionId, Session>,
}

#[derive(Debug, Eq, PartialEq)]
pub enum ServerError {
    UnknownConnection(ConnectionId),
    InvalidSessionId(SessionId),
    DuplicateOperation(OperationId),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::UnknownConnection(id) => {
                write!(f, "connection {} isn't in any session", id)
            }
            ServerError::InvalidSessionId(id) => write!(f, "session {} doesn't exist", id),
            ServerError::DuplicateOperation(id) => {
                write!(f, "operation {} was already relayed", id)
            }
        }
    }
}

impl std::error::Error for ServerError {}

impl From<DuplicateOperation> for ServerError {
    fn from(e: DuplicateOperation) -> Self {
        ServerError::DuplicateOperation(e.0)
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            connection_locations: HashMap::new(),
            sessions: HashMap::new(),
        }
    }

    /// Sessions are created on first join and outlive their connections, so
    /// a board keeps its history while nobody is drawing on it.
    pub fn join_session(&mut self, session_id: SessionId) -> ConnectionId {
        let connection_id = self.new_connection_id();
        self.sessions
            .entry(session_id)
            .or_insert_with(|| {
                log::info!("Session {} created", session_id);
                Session::new(session_id)
            })
            .connections
            .push(connection_id);
        self.connection_locations.insert(connection_id, session_id);
        log::info!("Connection {} joined session {}", connection_id, session_id);
        connection_id
    }

    pub fn leave_session(&mut self, connection_id: &ConnectionId) -> Option<SessionId> {
        let session_id = self.connection_locations.remove(connection_id)?;
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.connections.retain(|c| c != connection_id);
        }
        log::info!("Connection {} left session {}", connection_id, session_id);
        Some(session_id)
    }

    pub fn session_of(&self, connection_id: &ConnectionId) -> Result<SessionId, ServerError> {
        self.connection_locations
            .get(connection_id)
            .cloned()
            .ok_or(ServerError::UnknownConnection(*connection_id))
    }

    pub fn session_mut(&mut self, session_id: &SessionId) -> Result<&mut Session, ServerError> {
        self.sessions
            .get_mut(session_id)
            .ok_or(ServerError::InvalidSessionId(*session_id))
    }

    pub fn connection_ids_in_session(
        &self,
        session_id: &SessionId,
    ) -> Result<&[ConnectionId], ServerError> {
        self.sessions
            .get(session_id)
            .map(|s| s.connections.as_slice())
            .ok_or(ServerError::InvalidSessionId(*session_id))
    }

    pub fn describe_sessions(&self) -> Vec<SessionDescription> {
        let mut result = self
            .sessions
            .values()
            .map(|session| session.describe())
            .collect::<Vec<_>>();
        result.sort_by_key(|description| description.session_id);
        result
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        // skip ids still held by live connections after wrapping around
        loop {
            self.connection_id_source += Wrapping(1);
            let candidate = self.connection_id_source.0;
            if !self.connection_locations.contains_key(&candidate) {
                break candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_sync::euclid::default::Point2D;
    use canvas_sync::{Color, DrawOperation, Shape};

    #[test]
    fn it_should_create_session_on_first_join() {
        let mut state = ServerState::new();
        let a = state.join_session(7);
        let b = state.join_session(7);
        assert_ne!(a, b);
        assert_eq!(state.connection_ids_in_session(&7), Ok(&[a, b][..]));
        assert_eq!(state.session_of(&b), Ok(7));
    }

    #[test]
    fn it_should_keep_history_when_all_connections_leave() {
        let mut state = ServerState::new();
        let connection_id = state.join_session(1);
        state
            .session_mut(&1)
            .expect("")
            .history
            .append(DrawOperation::new(
                canvas_sync::uuid::Uuid::new_v4(),
                Point2D::new(1.0, 1.0),
                3.0,
                Color::default(),
                Shape::Circle,
                false,
            ))
            .expect("fresh id");
        assert_eq!(state.leave_session(&connection_id), Some(1));
        assert_eq!(state.leave_session(&connection_id), None);

        assert_eq!(
            state.describe_sessions(),
            vec![SessionDescription {
                session_id: 1,
                connections: 0,
                history_length: 1,
            }]
        );
        assert_eq!(
            state.session_of(&connection_id),
            Err(ServerError::UnknownConnection(connection_id))
        );
    }

    #[test]
    fn it_should_not_reuse_ids_of_live_connections() {
        let mut state = ServerState::new();
        let first = state.join_session(0);
        state.connection_id_source = Wrapping(ConnectionId::MAX);
        let wrapped = state.join_session(0);
        assert_eq!(wrapped, 0);
        assert_ne!(state.join_session(0), first);
    }
}
