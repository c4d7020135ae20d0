use canvas_sync::SessionId;
use serde::Serialize;
use tokio::sync::oneshot::Sender;

#[derive(Debug)]
pub enum AdminCommand {
    ListSessions {
        tx: Sender<Vec<SessionDescription>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    pub session_id: SessionId,
    pub connections: usize,
    pub history_length: usize,
}
