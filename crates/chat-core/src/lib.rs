//! # chat-core
//!
//! Value objects shared by the REST and gateway transports.
//! This crate has zero dependencies on I/O (HTTP client, sockets, runtime).

pub mod error;
pub mod media;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::DataUriError;
pub use media::{image_data_uri, ImageFormat};
pub use value_objects::{Intents, Nullable, Snowflake, SnowflakeParseError};
