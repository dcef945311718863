//! Multipart request bodies
//!
//! Messages with attachments are sent as `multipart/form-data`: a
//! `payload_json` part carrying the JSON body and one `files[i]` part per
//! file. The payload is kept as plain data so a fresh form can be built for
//! each retry attempt.

use crate::error::{HttpError, HttpResult};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Map, Value};

const OCTET_STREAM: &str = "application/octet-stream";

/// A file uploaded alongside a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub data: Vec<u8>,
    pub description: Option<String>,
}

impl FileAttachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            description: None,
        }
    }

    /// Set the alt-text description shown for the attachment
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// JSON payload plus files, rebuilt into a form on every attempt
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPayload {
    payload: Value,
    files: Vec<FileAttachment>,
}

impl MultipartPayload {
    /// Combine a JSON body with files
    ///
    /// An `attachments` array describing each file is merged into the body.
    pub fn new<T: Serialize + ?Sized>(payload: &T, files: Vec<FileAttachment>) -> HttpResult<Self> {
        let mut payload = serde_json::to_value(payload).map_err(HttpError::Encode)?;

        let attachments: Vec<Value> = files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let mut entry = Map::new();
                entry.insert("id".to_string(), json!(index));
                entry.insert("filename".to_string(), json!(file.filename));
                if let Some(description) = &file.description {
                    entry.insert("description".to_string(), json!(description));
                }
                Value::Object(entry)
            })
            .collect();

        match &mut payload {
            Value::Object(map) => {
                map.insert("attachments".to_string(), Value::Array(attachments));
            }
            Value::Null => {
                payload = json!({ "attachments": attachments });
            }
            _ => return Err(HttpError::Form("payload must be a JSON object".to_string())),
        }

        Ok(Self { payload, files })
    }

    /// The JSON body including the generated `attachments` array
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn files(&self) -> &[FileAttachment] {
        &self.files
    }

    /// Build a fresh multipart form
    pub fn to_form(&self) -> HttpResult<Form> {
        let payload_json = serde_json::to_string(&self.payload).map_err(HttpError::Encode)?;
        let mut form = Form::new().text("payload_json", payload_json);

        for (index, file) in self.files.iter().enumerate() {
            let part = Part::bytes(file.data.clone())
                .file_name(file.filename.clone())
                .mime_str(OCTET_STREAM)
                .map_err(|e| HttpError::Form(e.to_string()))?;
            form = form.part(format!("files[{index}]"), part);
        }

        Ok(form)
    }
}
