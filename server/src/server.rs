use std::collections::HashMap;

use tokio::sync::mpsc::{channel, Sender};

use canvas_sync::{ClientMessage, ConnectionId, RelayMessage, SessionId};

use crate::admin::AdminCommand;
use crate::connection::{ConnectionCommand, ConnectionEvent, ConnectionTx};
use crate::server_state::{ServerError, ServerState};

#[derive(Debug)]
pub enum ServerCommand {
    Connection(ConnectionCommand),
    Admin(AdminCommand),
}

pub type ServerTx = Sender<ServerCommand>;

/// Egress channels of the live connections.
struct Outbox {
    txs: HashMap<ConnectionId, ConnectionTx>,
}

impl Outbox {
    fn new() -> Self {
        Self {
            txs: HashMap::new(),
        }
    }

    fn register(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.txs.insert(connection_id, tx);
    }

    fn unregister(&mut self, connection_id: &ConnectionId) {
        self.txs.remove(connection_id);
    }

    /// Waits for room in the connection's channel. A connection whose
    /// channel is closed is unregistered, so it is warned about only once.
    async fn deliver(&mut self, to: &ConnectionId, event: ConnectionEvent) {
        let closed = match self.txs.get_mut(to) {
            Some(tx) => tx.send(event).await.is_err(),
            None => {
                log::debug!("Connection {} has no egress channel", to);
                false
            }
        };
        if closed {
            log::warn!("Connection {} stopped receiving, event dropped", to);
            self.txs.remove(to);
        }
    }
}

struct Server {
    server_state: ServerState,
    outbox: Outbox,
}

impl Server {
    fn new() -> Self {
        Self {
            server_state: ServerState::new(),
            outbox: Outbox::new(),
        }
    }

    async fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connection(command) => self.handle_connection_command(command).await,
            ServerCommand::Admin(command) => self.handle_admin_command(command),
        }
    }

    async fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx, session_id } => {
                let connection_id = self.server_state.join_session(session_id);
                self.outbox.register(connection_id, tx);
                self.outbox
                    .deliver(&connection_id, ConnectionEvent::Connected { connection_id })
                    .await;
                if let Err(e) = self.send_history(&connection_id, &session_id).await {
                    log::warn!("Cannot send history to {}: {}", connection_id, e);
                }
            }
            ConnectionCommand::Disconnect { from } => {
                self.server_state.leave_session(&from);
                self.outbox.unregister(&from);
            }
            ConnectionCommand::Message { from, message } => {
                if let Err(e) = self.handle_client_message(&from, message).await {
                    log::warn!("Dropping message from {}: {}", from, e);
                }
            }
        }
    }

    fn handle_admin_command(&mut self, command: AdminCommand) {
        match command {
            AdminCommand::ListSessions { tx } => {
                if tx.send(self.server_state.describe_sessions()).is_err() {
                    log::warn!("Session listing requester went away");
                }
            }
        }
    }

    async fn handle_client_message(
        &mut self,
        from: &ConnectionId,
        message: ClientMessage,
    ) -> Result<(), ServerError> {
        let session_id = self.server_state.session_of(from)?;
        let session = self.server_state.session_mut(&session_id)?;
        let relayed = match message {
            ClientMessage::Draw(op) => {
                session.history.append(op.clone())?;
                RelayMessage::Draw(op)
            }
            ClientMessage::ClearCanvas => {
                log::info!("Session {} cleared by {}", session_id, from);
                session.history.clear();
                RelayMessage::ClearCanvas
            }
        };
        self.broadcast(&session_id, relayed, Some(from)).await
    }

    async fn send_history(
        &mut self,
        to: &ConnectionId,
        session_id: &SessionId,
    ) -> Result<(), ServerError> {
        let snapshot = self.server_state.session_mut(session_id)?.history.snapshot();
        log::debug!("Sending {} operations to {}", snapshot.len(), to);
        self.outbox
            .deliver(
                to,
                ConnectionEvent::Message(RelayMessage::DrawingHistory(snapshot)),
            )
            .await;
        Ok(())
    }

    async fn broadcast(
        &mut self,
        session_id: &SessionId,
        message: RelayMessage,
        without: Option<&ConnectionId>,
    ) -> Result<(), ServerError> {
        let targets = self
            .server_state
            .connection_ids_in_session(session_id)?
            .iter()
            .filter(|c| without != Some(*c))
            .cloned()
            .collect::<Vec<_>>();
        for connection_id in targets {
            self.outbox
                .deliver(&connection_id, ConnectionEvent::Message(message.clone()))
                .await;
        }
        Ok(())
    }
}

/// Spawns the relay loop. Every session and connection table lives inside
/// the spawned task; the returned sender is the only way to reach it.
pub fn spawn_server(capacity: usize) -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ServerCommand>(capacity);

    tokio::spawn(async move {
        let mut server = Box::new(Server::new());

        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command).await;
        }
        log::info!("Relay loop terminated");
    });

    srv_tx
}
