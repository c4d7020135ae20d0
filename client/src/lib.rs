pub mod error;
pub mod script;
pub mod session;

pub use error::ClientError;
pub use session::{run_session, SessionOptions};
