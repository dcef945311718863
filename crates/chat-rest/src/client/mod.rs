//! Rate-limited request dispatch

mod form;
mod request;
mod requester;

pub use form::{FileAttachment, MultipartPayload};
pub use request::{AuthMode, Request, RequestBody};
pub use requester::{Requester, MAX_ATTEMPTS};
