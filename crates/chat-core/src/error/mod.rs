//! Core error types

mod data_uri_error;

pub use data_uri_error::DataUriError;
