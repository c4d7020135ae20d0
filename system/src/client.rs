use crate::canvas::Canvas;
use crate::flood_fill::flood_fill;
use crate::message::*;
use crate::render::{apply_operation, StrokeState};
use crate::tool::ToolContext;
use euclid::default::Point2D;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// How many of our own operation ids are remembered for echo suppression.
const SENT_WINDOW: usize = 4096;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SyncState {
    Connecting,
    /// Connected, waiting for the drawing history.
    Syncing,
    Live,
}

/// Local input, as produced by a pointer device and tool controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    SetBrushSize { size: f32 },
    SetColor { color: Color },
    SetShape { shape: Shape },
    ToggleEraser,
    ToggleFillMode,
    ClearCanvas,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    Input(InputEvent),
    Relay(RelayMessage),
}

/// One participant: its canvas, tools and sync state.
///
/// Every event goes through [`DrawingClient::handle_event`], and every
/// operation, wherever it came from, is rendered by the same
/// [`apply_operation`].
pub struct DrawingClient {
    state: SyncState,
    canvas: Canvas,
    strokes: StrokeState,
    tool: ToolContext,
    active_stroke: Option<StrokeId>,
    sent_ids: HashSet<OperationId>,
    sent_order: VecDeque<OperationId>,
}

impl DrawingClient {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: SyncState::Connecting,
            canvas: Canvas::new(width, height),
            strokes: StrokeState::new(),
            tool: ToolContext::default(),
            active_stroke: None,
            sent_ids: HashSet::new(),
            sent_order: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == SyncState::Live
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn tool(&self) -> &ToolContext {
        &self.tool
    }

    /// Returns the messages to submit to the relay.
    pub fn handle_event(&mut self, event: ClientEvent) -> Vec<ClientMessage> {
        match event {
            ClientEvent::Connected => {
                log::info!("Connected, waiting for drawing history");
                self.state = SyncState::Syncing;
                Vec::new()
            }
            ClientEvent::Disconnected => {
                log::info!("Disconnected, canvas will resync on reconnect");
                self.state = SyncState::Connecting;
                self.active_stroke = None;
                Vec::new()
            }
            ClientEvent::Input(input) => self.handle_input(input),
            ClientEvent::Relay(message) => {
                self.handle_relay_message(message);
                Vec::new()
            }
        }
    }

    fn handle_input(&mut self, input: InputEvent) -> Vec<ClientMessage> {
        match input {
            InputEvent::SetBrushSize { size } => self.tool.set_brush_size(size),
            InputEvent::SetColor { color } => self.tool.set_color(color),
            InputEvent::SetShape { shape } => self.tool.set_shape(shape),
            InputEvent::ToggleEraser => self.tool.toggle_eraser(),
            InputEvent::ToggleFillMode => self.tool.toggle_fill_mode(),
            InputEvent::PointerUp => {
                if let Some(stroke) = self.active_stroke.take() {
                    self.strokes.end(&stroke);
                }
            }
            drawing_input => {
                if !self.is_live() {
                    log::debug!("Not live yet ({:?}), dropping {:?}", self.state, drawing_input);
                    return Vec::new();
                }
                return self.handle_drawing_input(drawing_input);
            }
        }
        Vec::new()
    }

    fn handle_drawing_input(&mut self, input: InputEvent) -> Vec<ClientMessage> {
        if let InputEvent::PointerDown { x, y } | InputEvent::PointerMove { x, y } = input {
            if !(x.is_finite() && y.is_finite()) {
                log::warn!("Dropping pointer input at non-finite position ({}, {})", x, y);
                return Vec::new();
            }
        }
        match input {
            InputEvent::PointerDown { x, y } if self.tool.fill_mode => {
                let seed = Point2D::new(x.floor() as i64, y.floor() as i64);
                let region = flood_fill(&mut self.canvas, seed, self.tool.brush_color);
                let ops = region.to_operations(uuid::Uuid::new_v4());
                ops.into_iter()
                    .map(|op| {
                        self.remember_sent(op.id);
                        ClientMessage::Draw(op)
                    })
                    .collect()
            }
            InputEvent::PointerDown { .. } => {
                if let Some(stroke) = self.active_stroke.replace(uuid::Uuid::new_v4()) {
                    self.strokes.end(&stroke);
                }
                Vec::new()
            }
            InputEvent::PointerMove { x, y } => match self.active_stroke {
                Some(stroke) => {
                    let op = self.tool.create_operation(stroke, Point2D::new(x, y));
                    apply_operation(&mut self.canvas, &mut self.strokes, &op);
                    self.remember_sent(op.id);
                    vec![ClientMessage::Draw(op)]
                }
                None => Vec::new(),
            },
            InputEvent::ClearCanvas => {
                self.reset_canvas();
                vec![ClientMessage::ClearCanvas]
            }
            other => {
                log::warn!("Unexpected drawing input {:?}", other);
                Vec::new()
            }
        }
    }

    fn handle_relay_message(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::DrawingHistory(ops) => {
                self.reset_canvas();
                self.sent_ids.clear();
                self.sent_order.clear();
                let ignored = ops
                    .iter()
                    .filter(|op| !apply_operation(&mut self.canvas, &mut self.strokes, op))
                    .count();
                log::info!(
                    "Replayed {} operations from history ({} ignored)",
                    ops.len(),
                    ignored
                );
                self.state = SyncState::Live;
            }
            RelayMessage::Draw(op) => {
                if !self.is_live() {
                    log::warn!("Operation {} arrived before history, dropping", op.id);
                } else if self.sent_ids.remove(&op.id) {
                    log::debug!("Skipping echo of own operation {}", op.id);
                } else {
                    apply_operation(&mut self.canvas, &mut self.strokes, &op);
                }
            }
            RelayMessage::ClearCanvas => self.reset_canvas(),
        }
    }

    fn reset_canvas(&mut self) {
        self.canvas.clear();
        self.strokes.reset();
    }

    fn remember_sent(&mut self, id: OperationId) {
        if self.sent_order.len() == SENT_WINDOW {
            if let Some(oldest) = self.sent_order.pop_front() {
                self.sent_ids.remove(&oldest);
            }
        }
        self.sent_order.push_back(id);
        self.sent_ids.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BLANK;

    fn live_client() -> DrawingClient {
        let mut client = DrawingClient::new(100, 100);
        client.handle_event(ClientEvent::Connected);
        client.handle_event(ClientEvent::Relay(RelayMessage::DrawingHistory(Vec::new())));
        client
    }

    fn input(client: &mut DrawingClient, input: InputEvent) -> Vec<ClientMessage> {
        client.handle_event(ClientEvent::Input(input))
    }

    #[test]
    fn it_should_move_through_sync_states() {
        let mut client = DrawingClient::new(10, 10);
        assert_eq!(client.state(), SyncState::Connecting);
        client.handle_event(ClientEvent::Connected);
        assert_eq!(client.state(), SyncState::Syncing);
        client.handle_event(ClientEvent::Relay(RelayMessage::DrawingHistory(Vec::new())));
        assert_eq!(client.state(), SyncState::Live);
        client.handle_event(ClientEvent::Disconnected);
        assert_eq!(client.state(), SyncState::Connecting);
    }

    #[test]
    fn it_should_draw_locally_before_sending() {
        let mut client = live_client();
        input(&mut client, InputEvent::SetShape { shape: Shape::Square });
        input(&mut client, InputEvent::SetBrushSize { size: 10.0 });
        assert!(input(&mut client, InputEvent::PointerDown { x: 50.0, y: 50.0 }).is_empty());
        let sent = input(&mut client, InputEvent::PointerMove { x: 50.0, y: 50.0 });

        assert_eq!(sent.len(), 1);
        assert_eq!(client.canvas().count([0, 0, 0, 255]), 100);
        match &sent[0] {
            ClientMessage::Draw(op) => {
                assert_eq!(op.shape, Shape::Square);
                assert_eq!(op.brush_size, 10.0);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn it_should_not_draw_without_pressed_pointer() {
        let mut client = live_client();
        assert!(input(&mut client, InputEvent::PointerMove { x: 5.0, y: 5.0 }).is_empty());
        input(&mut client, InputEvent::PointerDown { x: 5.0, y: 5.0 });
        input(&mut client, InputEvent::PointerUp);
        assert!(input(&mut client, InputEvent::PointerMove { x: 5.0, y: 5.0 }).is_empty());
        assert!(client.canvas().is_blank());
    }

    #[test]
    fn it_should_ignore_drawing_until_live() {
        let mut client = DrawingClient::new(10, 10);
        client.handle_event(ClientEvent::Connected);
        input(&mut client, InputEvent::PointerDown { x: 5.0, y: 5.0 });
        assert!(input(&mut client, InputEvent::PointerMove { x: 5.0, y: 5.0 }).is_empty());
        assert!(input(&mut client, InputEvent::ClearCanvas).is_empty());
        input(&mut client, InputEvent::ToggleEraser);
        assert!(client.tool().eraser_mode);
    }

    #[test]
    fn it_should_start_a_new_stroke_on_each_press() {
        let mut client = live_client();
        input(&mut client, InputEvent::PointerDown { x: 0.0, y: 0.0 });
        let first = input(&mut client, InputEvent::PointerMove { x: 10.0, y: 10.0 });
        input(&mut client, InputEvent::PointerUp);
        input(&mut client, InputEvent::PointerDown { x: 0.0, y: 0.0 });
        let second = input(&mut client, InputEvent::PointerMove { x: 90.0, y: 90.0 });

        let stroke_of = |messages: &[ClientMessage]| match &messages[0] {
            ClientMessage::Draw(op) => op.stroke,
            other => panic!("unexpected message {:?}", other),
        };
        assert_ne!(stroke_of(&first), stroke_of(&second));
        // first point of each stroke only records the pen position
        assert!(client.canvas().is_blank());
    }

    #[test]
    fn it_should_submit_fill_as_square_operations() {
        let mut client = live_client();
        input(&mut client, InputEvent::SetColor { color: Color::new(0, 0x80, 0) });
        input(&mut client, InputEvent::ToggleFillMode);
        let sent = input(&mut client, InputEvent::PointerDown { x: 10.5, y: 20.5 });
        assert_eq!(client.canvas().count([0, 0x80, 0, 255]), 100 * 100);
        assert_eq!(sent.len(), 1);

        // moves in fill mode do not paint
        assert!(input(&mut client, InputEvent::PointerMove { x: 1.0, y: 1.0 }).is_empty());
    }

    #[test]
    fn it_should_skip_echoes_of_own_operations() {
        let mut client = live_client();
        input(&mut client, InputEvent::SetShape { shape: Shape::Circle });
        input(&mut client, InputEvent::PointerDown { x: 50.0, y: 50.0 });
        let sent = input(&mut client, InputEvent::PointerMove { x: 50.0, y: 50.0 });
        let op = match sent.into_iter().next() {
            Some(ClientMessage::Draw(op)) => op,
            other => panic!("unexpected message {:?}", other),
        };

        input(&mut client, InputEvent::ClearCanvas);
        client.handle_event(ClientEvent::Relay(RelayMessage::Draw(op.clone())));
        assert!(client.canvas().is_blank());

        // only the first echo is suppressed
        client.handle_event(ClientEvent::Relay(RelayMessage::Draw(op)));
        assert!(!client.canvas().is_blank());
    }

    #[test]
    fn it_should_drop_remote_draws_before_history() {
        let mut client = DrawingClient::new(10, 10);
        client.handle_event(ClientEvent::Connected);
        let mut tool = ToolContext::default();
        tool.set_shape(Shape::Square);
        let op = tool.create_operation(uuid::Uuid::new_v4(), Point2D::new(1.0, 1.0));
        client.handle_event(ClientEvent::Relay(RelayMessage::Draw(op)));
        assert!(client.canvas().is_blank());
    }

    #[test]
    fn it_should_replace_canvas_on_resync() {
        let mut client = live_client();
        input(&mut client, InputEvent::SetShape { shape: Shape::Square });
        input(&mut client, InputEvent::PointerDown { x: 0.0, y: 0.0 });
        input(&mut client, InputEvent::PointerMove { x: 20.0, y: 20.0 });
        assert!(!client.canvas().is_blank());

        client.handle_event(ClientEvent::Disconnected);
        client.handle_event(ClientEvent::Connected);
        client.handle_event(ClientEvent::Relay(RelayMessage::DrawingHistory(Vec::new())));
        assert!(client.canvas().is_blank());
        assert_eq!(client.canvas().pixel(20, 20), BLANK);
    }

    #[test]
    fn it_should_parse_input_scripts() {
        let line = r##"{"type":"setColor","color":"#FF0000"}"##;
        let event: InputEvent = serde_json::from_str(line).expect("");
        assert_eq!(event, InputEvent::SetColor { color: Color::new(0xff, 0, 0) });

        let line = r#"{"type":"pointerMove","x":1.5,"y":2}"#;
        let event: InputEvent = serde_json::from_str(line).expect("");
        assert_eq!(event, InputEvent::PointerMove { x: 1.5, y: 2.0 });
    }

    #[test]
    fn it_should_drop_pointer_input_at_non_finite_positions() {
        let mut client = live_client();
        let red = Color::new(255, 0, 0);
        input(&mut client, InputEvent::SetColor { color: red });
        input(&mut client, InputEvent::ToggleFillMode);
        assert!(input(&mut client, InputEvent::PointerDown { x: f32::NAN, y: 3.0 }).is_empty());
        assert!(client.canvas().is_blank());

        input(&mut client, InputEvent::ToggleFillMode);
        input(&mut client, InputEvent::PointerDown { x: 5.0, y: 5.0 });
        let moved = InputEvent::PointerMove {
            x: f32::INFINITY,
            y: 5.0,
        };
        assert!(input(&mut client, moved).is_empty());
        assert_eq!(input(&mut client, InputEvent::PointerMove { x: 6.0, y: 5.0 }).len(), 1);
    }
}
