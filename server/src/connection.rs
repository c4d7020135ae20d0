use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use canvas_sync::{
    ClientMessage, CodecError, ConnectionId, Frame, RelayMessage, SessionId, WireFormat,
};

use crate::server::{ServerCommand, ServerTx};

/// Capacity of the per-connection egress channel.
const EGRESS_CAPACITY: usize = 32;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;
pub type IngressTx = UnboundedSender<ConnectionCommand>;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: ConnectionTx,
        session_id: SessionId,
    },
    Disconnect {
        from: ConnectionId,
    },
    Message {
        from: ConnectionId,
        message: ClientMessage,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    Message(RelayMessage),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    Idle,
    Connected(ConnectionId),
}

/// Forwards a connection's commands to the relay loop in arrival order.
///
/// The actor never blocks on the relay queue: commands wait in the unbounded
/// ingress channel while the task waits for room in the bounded relay queue.
pub fn spawn_ingress_pump(mut srv_tx: ServerTx) -> IngressTx {
    let (ingress_tx, mut ingress_rx) = unbounded_channel::<ConnectionCommand>();

    tokio::spawn(async move {
        while let Some(command) = ingress_rx.recv().await {
            if srv_tx.send(ServerCommand::Connection(command)).await.is_err() {
                log::error!("Relay loop is gone, dropping connection commands");
                break;
            }
        }
    });

    ingress_tx
}

struct ConnectionActor {
    state: ConnectionState,
    ingress_tx: IngressTx,
    session_id: SessionId,
    format: WireFormat,
}

impl ConnectionActor {
    fn send_to_server(&mut self, command: ConnectionCommand) {
        if self.ingress_tx.send(command).is_err() {
            log::error!("Ingress pump is gone, command dropped");
        }
    }

    fn forward(&mut self, decoded: Result<ClientMessage, CodecError>) {
        let from = match self.state {
            ConnectionState::Connected(from) => from,
            ConnectionState::Idle => {
                log::warn!("Frame arrived before the relay accepted the connection");
                return;
            }
        };
        match decoded {
            Ok(message) => {
                log::debug!("Ingress from {}: {:?}", from, message);
                self.send_to_server(ConnectionCommand::Message { from, message });
            }
            Err(e) => log::warn!("Dropping undecodable frame from {}: {}", from, e),
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(EGRESS_CAPACITY);

        self.send_to_server(ConnectionCommand::Connect {
            tx,
            session_id: self.session_id,
        });

        let addr = ctx.address().recipient();

        tokio::spawn(async move {
            let addr = addr;
            log::debug!("connection green thread - started");
            while let Some(msg) = rx.recv().await {
                if addr.do_send(ConnectionActorMessage(msg)).is_err() {
                    break;
                }
            }
            log::debug!("connection green thread - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            self.send_to_server(ConnectionCommand::Disconnect { from: id });
            self.state = ConnectionState::Idle;
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Binary(bin)) => {
                log::debug!("Ingress size: {}", bin.len());
                let decoded = self.format.decode_binary::<ClientMessage>(&bin);
                self.forward(decoded);
            }
            Ok(ws::Message::Text(text)) => {
                log::debug!("Ingress size: {}", text.len());
                let decoded = self.format.decode_text::<ClientMessage>(&text);
                self.forward(decoded);
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                log::warn!("Websocket protocol error: {}", e);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Connected { connection_id } => {
                log::debug!("Egress: connected as {}", connection_id);
                self.state = ConnectionState::Connected(connection_id);
            }
            ConnectionEvent::Message(message) => {
                log::debug!("Egress {:?}", message);
                match self.format.encode(&message) {
                    Ok(Frame::Binary(bytes)) => ctx.binary(bytes),
                    Ok(Frame::Text(text)) => ctx.text(text),
                    Err(e) => log::error!("Cannot encode relay message: {}", e),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub format: Option<WireFormat>,
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    params: web::Query<ConnectParams>,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    let session_id = match req
        .match_info()
        .get("session_id")
        .and_then(|s| s.parse::<SessionId>().ok())
    {
        Some(session_id) => session_id,
        None => return Ok(HttpResponse::BadRequest().body("invalid session id")),
    };
    ws::start(
        ConnectionActor {
            ingress_tx: spawn_ingress_pump(srv_tx.get_ref().clone()),
            state: ConnectionState::Idle,
            session_id,
            format: params.format.unwrap_or_default(),
        },
        &req,
        stream,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::spawn_server;
    use canvas_sync::euclid::default::Point2D;
    use canvas_sync::{Color, DrawOperation, Shape};
    use tokio::sync::mpsc::{channel, Receiver};

    fn connect(ingress_tx: &IngressTx, session_id: SessionId) -> Receiver<ConnectionEvent> {
        let (tx, rx) = channel(EGRESS_CAPACITY);
        ingress_tx
            .send(ConnectionCommand::Connect { tx, session_id })
            .expect("pump is running");
        rx
    }

    async fn joined(rx: &mut Receiver<ConnectionEvent>) -> (ConnectionId, Vec<DrawOperation>) {
        let connection_id = match rx.recv().await {
            Some(ConnectionEvent::Connected { connection_id }) => connection_id,
            other => panic!("expected Connected, got {:?}", other),
        };
        match rx.recv().await {
            Some(ConnectionEvent::Message(RelayMessage::DrawingHistory(ops))) => {
                (connection_id, ops)
            }
            other => panic!("expected history, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_should_relay_bursts_larger_than_the_relay_queue() {
        let capacity = 4;
        let srv_tx = spawn_server(capacity);
        let a_ingress = spawn_ingress_pump(srv_tx.clone());
        let b_ingress = spawn_ingress_pump(srv_tx.clone());

        let mut a_rx = connect(&a_ingress, 9);
        let (a, _) = joined(&mut a_rx).await;
        let mut b_rx = connect(&b_ingress, 9);
        joined(&mut b_rx).await;

        // a bucket fill arrives as hundreds of frames back to back
        let burst = (0..400)
            .map(|i| {
                DrawOperation::new(
                    canvas_sync::uuid::Uuid::new_v4(),
                    Point2D::new(i as f32, 1.0),
                    1.0,
                    Color::new(0, 0, 255),
                    Shape::Square,
                    false,
                )
            })
            .collect::<Vec<_>>();
        assert!(burst.len() > capacity * 10);
        for op in &burst {
            a_ingress
                .send(ConnectionCommand::Message {
                    from: a,
                    message: ClientMessage::Draw(op.clone()),
                })
                .expect("pump is running");
        }

        for op in &burst {
            match b_rx.recv().await {
                Some(ConnectionEvent::Message(RelayMessage::Draw(received))) => {
                    assert_eq!(&received, op)
                }
                other => panic!("expected a draw, got {:?}", other),
            }
        }

        // queued behind the burst on the same pump, so it sees all of it
        let mut late_rx = connect(&a_ingress, 9);
        let (_, history) = joined(&mut late_rx).await;
        assert_eq!(history, burst);
    }

    #[tokio::test]
    async fn it_should_keep_connect_and_disconnect_in_order() {
        let mut srv_tx = spawn_server(1);
        let ingress_tx = spawn_ingress_pump(srv_tx.clone());
        let mut rx = connect(&ingress_tx, 10);
        let (id, _) = joined(&mut rx).await;
        ingress_tx
            .send(ConnectionCommand::Disconnect { from: id })
            .expect("pump is running");
        drop(ingress_tx);

        // the egress channel closes once the relay forgets the connection
        assert!(rx.recv().await.is_none());

        let (tx, reply) = tokio::sync::oneshot::channel();
        srv_tx
            .send(ServerCommand::Admin(crate::admin::AdminCommand::ListSessions { tx }))
            .await
            .expect("relay is running");
        assert_eq!(reply.await.expect("relay replies")[0].connections, 0);
    }
}
