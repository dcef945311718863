//! Integration test utilities for the chat client
//!
//! In-process mock servers for the REST API and the gateway, plus response
//! and frame builders shared by the tests.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
