//! In-memory conversation transcript and per-session context

pub mod session;
pub mod types;

pub use session::SessionContext;
pub use types::{Role, Transcript, Turn};
