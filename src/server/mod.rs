mod flusher;
mod server;

pub use flusher::*;
pub use server::*;
