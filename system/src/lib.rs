mod canvas;
pub mod client;
pub mod codec;
pub mod flood_fill;
mod history;
mod message;
pub mod raster;
pub mod render;
mod tool;

pub use canvas::*;
pub use client::{ClientEvent, DrawingClient, InputEvent, SyncState};
pub use codec::{CodecError, Frame, WireFormat};
pub use flood_fill::{flood_fill, FilledRegion, PixelSquare};
pub use history::*;
pub use message::*;
pub use render::{apply_operation, StrokeState};
pub use tool::*;

pub extern crate bincode;
pub extern crate euclid;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;
