pub mod builder;
pub mod handler;
pub mod listener;

pub use builder::{PeerBound, ServerBuilder};
pub use handler::RequestHandler;
