//! Input scripts: one JSON-encoded [`InputEvent`] per line.
//!
//! ```text
//! {"type":"setColor","color":"#FF0000"}
//! {"type":"pointerDown","x":10,"y":10}
//! {"type":"pointerMove","x":40,"y":12}
//! {"type":"pointerUp"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::error::ClientError;
use canvas_sync::InputEvent;
use std::io::BufRead;
use std::path::Path;

pub fn parse_script<R: BufRead>(reader: R) -> Result<Vec<InputEvent>, ClientError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str::<InputEvent>(line).map_err(|source| {
            ClientError::Script {
                line: index + 1,
                source,
            }
        })?;
        events.push(event);
    }
    Ok(events)
}

pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<InputEvent>, ClientError> {
    let file = std::fs::File::open(path.as_ref())?;
    let events = parse_script(std::io::BufReader::new(file))?;
    log::info!(
        "Loaded {} input events from {}",
        events.len(),
        path.as_ref().display()
    );
    Ok(events)
}
