//! Dispatch events and their listeners

mod dispatch;
mod router;

pub use dispatch::DispatchEvent;
pub use router::{EventRouter, ListenerId};
