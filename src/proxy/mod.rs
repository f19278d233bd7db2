//! HTTP gateway server

mod events;
mod handler;
pub mod server;
mod streaming;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{OutboundEvent, DONE_SENTINEL, ERROR_SENTINEL};
pub use handler::Question;
pub use server::{build_router, run_server, AppState};
pub use streaming::answer_stream;
