use std::fmt;
use std::time::Duration;

use awc::ws;
use futures::{stream, Sink, SinkExt, StreamExt};

use canvas_sync::{
    ClientEvent, ClientMessage, DrawingClient, Frame, InputEvent, RelayMessage, WireFormat,
};

use crate::error::ClientError;

/// History replays arrive as one frame, so this bounds the board size a
/// client can join.
const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Websocket endpoint of a session, e.g. `ws://127.0.0.1:8080/ws/1`.
    pub url: String,
    pub format: WireFormat,
    pub width: u32,
    pub height: u32,
    /// Delay before each scripted input.
    pub pace: Duration,
    /// How long to keep applying remote operations after the script ends.
    pub linger: Duration,
}

impl SessionOptions {
    pub fn endpoint(&self) -> String {
        match self.format {
            WireFormat::Binary => self.url.clone(),
            WireFormat::Json if self.url.contains('?') => format!("{}&format=json", self.url),
            WireFormat::Json => format!("{}?format=json", self.url),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Inbound {
    Relay(RelayMessage),
    Ping(Vec<u8>),
    Close,
    Skip,
}

fn decode_frame(format: WireFormat, frame: ws::Frame) -> Inbound {
    let decoded = match frame {
        ws::Frame::Binary(bytes) => format.decode_binary::<RelayMessage>(&bytes),
        ws::Frame::Text(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) => format.decode_text::<RelayMessage>(text),
            Err(e) => {
                log::warn!("Dropping non utf-8 text frame: {}", e);
                return Inbound::Skip;
            }
        },
        ws::Frame::Ping(payload) => return Inbound::Ping(payload.to_vec()),
        ws::Frame::Close(reason) => {
            log::info!("Relay closed the connection: {:?}", reason);
            return Inbound::Close;
        }
        _ => return Inbound::Skip,
    };
    match decoded {
        Ok(message) => Inbound::Relay(message),
        Err(e) => {
            log::warn!("Dropping undecodable frame: {}", e);
            Inbound::Skip
        }
    }
}

async fn submit<S>(
    sink: &mut S,
    format: WireFormat,
    messages: Vec<ClientMessage>,
) -> Result<(), ClientError>
where
    S: Sink<ws::Message> + Unpin,
    S::Error: fmt::Display,
{
    for message in messages {
        let message = match format.encode(&message) {
            Ok(Frame::Binary(bytes)) => ws::Message::Binary(bytes.into()),
            Ok(Frame::Text(text)) => ws::Message::Text(text),
            Err(e) => {
                log::error!("Cannot encode {:?}: {}", message, e);
                continue;
            }
        };
        sink.send(message)
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
    }
    Ok(())
}

/// Applies one frame. Returns `false` once the relay has closed the
/// connection.
async fn process_frame<S>(
    client: &mut DrawingClient,
    sink: &mut S,
    format: WireFormat,
    frame: ws::Frame,
) -> Result<bool, ClientError>
where
    S: Sink<ws::Message> + Unpin,
    S::Error: fmt::Display,
{
    match decode_frame(format, frame) {
        Inbound::Relay(message) => {
            log::debug!("Ingress {:?}", message);
            let outgoing = client.handle_event(ClientEvent::Relay(message));
            submit(sink, format, outgoing).await?;
        }
        Inbound::Ping(payload) => {
            sink.send(ws::Message::Pong(payload.into()))
                .await
                .map_err(|e| ClientError::Protocol(e.to_string()))?;
        }
        Inbound::Close => {
            client.handle_event(ClientEvent::Disconnected);
            return Ok(false);
        }
        Inbound::Skip => (),
    }
    Ok(true)
}

enum Step {
    Input(InputEvent),
    ScriptDone,
    Remote(Result<ws::Frame, String>),
}

/// Joins a session, replays its history, plays `script` while applying
/// remote operations, then lingers. Returns the client with its final
/// canvas.
pub async fn run_session(
    options: &SessionOptions,
    script: Vec<InputEvent>,
) -> Result<DrawingClient, ClientError> {
    let format = options.format;
    let mut client = DrawingClient::new(options.width, options.height);

    let endpoint = options.endpoint();
    log::info!("Connecting to {}", endpoint);
    let (_response, framed) = awc::Client::new()
        .ws(endpoint.as_str())
        .max_frame_size(MAX_FRAME_SIZE)
        .connect()
        .await
        .map_err(|e| ClientError::Connect(e.to_string()))?;
    let (mut sink, mut remote) = framed.split();
    client.handle_event(ClientEvent::Connected);

    while !client.is_live() {
        let frame = remote
            .next()
            .await
            .ok_or(ClientError::Closed)?
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        if !process_frame(&mut client, &mut sink, format, frame).await? {
            return Err(ClientError::Closed);
        }
    }
    log::info!("Synchronized, playing {} input events", script.len());

    let pace = options.pace;
    let inputs = stream::iter(script)
        .then(move |event| async move {
            if pace > Duration::from_millis(0) {
                actix_rt::time::delay_for(pace).await;
            }
            Step::Input(event)
        })
        .chain(stream::once(async { Step::ScriptDone }))
        .boxed_local();
    let frames = remote
        .by_ref()
        .map(|frame| Step::Remote(frame.map_err(|e| e.to_string())));
    let mut steps = stream::select(inputs, frames);

    let mut open = true;
    while let Some(step) = steps.next().await {
        match step {
            Step::Input(event) => {
                let outgoing = client.handle_event(ClientEvent::Input(event));
                submit(&mut sink, format, outgoing).await?;
            }
            Step::ScriptDone => break,
            Step::Remote(frame) => {
                let frame = frame.map_err(ClientError::Protocol)?;
                if !process_frame(&mut client, &mut sink, format, frame).await? {
                    open = false;
                    break;
                }
            }
        }
    }
    drop(steps);

    if !open {
        log::warn!("Connection closed while playing the script");
        return Ok(client);
    }

    let lingering = async {
        while let Some(frame) = remote.next().await {
            let frame = frame.map_err(|e| ClientError::Protocol(e.to_string()))?;
            if !process_frame(&mut client, &mut sink, format, frame).await? {
                break;
            }
        }
        Ok::<(), ClientError>(())
    };
    match actix_rt::time::timeout(options.linger, lingering).await {
        Ok(result) => result?,
        Err(_) => log::debug!("Linger of {:?} elapsed", options.linger),
    }

    if let Err(e) = sink.send(ws::Message::Close(None)).await {
        log::debug!("Close frame not sent: {}", e);
    }
    Ok(client)
}
