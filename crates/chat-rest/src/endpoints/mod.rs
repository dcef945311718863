//! Endpoint groups
//!
//! Each module is a set of free functions taking the [`Requester`](crate::Requester)
//! explicitly. They only describe the call (route, body, query, auth); all
//! rate limiting and retrying happens in the requester.

pub mod channels;
pub mod commands;
pub mod gateway;
pub mod guilds;
pub mod interactions;
pub mod message;
pub mod users;
pub mod webhooks;

pub use message::MessagePayload;
