use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use canvas_client::script::load_script;
use canvas_client::{run_session, ClientError, SessionOptions};
use canvas_sync::WireFormat;

/// Joins a drawing session, plays an input script and exports the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Websocket endpoint of the session
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws/1")]
    url: String,
    /// Frame encoding: `binary` (bincode) or `json`
    #[arg(long, default_value = "binary", value_parser = parse_format)]
    format: WireFormat,
    #[arg(long, default_value_t = 600)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// JSON-lines file of input events
    #[arg(long)]
    script: Option<PathBuf>,
    /// Milliseconds to wait before each scripted event
    #[arg(long, default_value_t = 0)]
    pace_ms: u64,
    /// Milliseconds to keep receiving after the script ends
    #[arg(long, default_value_t = 1000)]
    linger_ms: u64,
    /// Where to write the final canvas
    #[arg(long, default_value = "canvas.png")]
    output: PathBuf,
}

fn parse_format(value: &str) -> Result<WireFormat, String> {
    match value {
        "binary" => Ok(WireFormat::Binary),
        "json" => Ok(WireFormat::Json),
        other => Err(format!("unknown format {:?}, expected binary or json", other)),
    }
}

#[actix_rt::main]
async fn main() -> Result<(), ClientError> {
    env_logger::init();
    let cli = Cli::parse();

    let script = match &cli.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    let options = SessionOptions {
        url: cli.url,
        format: cli.format,
        width: cli.width,
        height: cli.height,
        pace: Duration::from_millis(cli.pace_ms),
        linger: Duration::from_millis(cli.linger_ms),
    };

    let client = run_session(&options, script).await?;
    client.canvas().save_png(&cli.output)?;
    Ok(())
}
