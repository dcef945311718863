//! Value objects - immutable types shared across the transports

mod intents;
mod nullable;
mod snowflake;

pub use intents::Intents;
pub use nullable::Nullable;
pub use snowflake::{Snowflake, SnowflakeParseError};
