//! Route descriptors
//!
//! A [`Route`] pairs an HTTP method with a path template such as
//! `/channels/{channel_id}/messages/{message_id}` and the parameters that fill
//! it. Besides the concrete path it yields the default rate-limit bucket key,
//! so every operation on one resource shares a scope before the server has
//! assigned a bucket hash.

use chat_core::Snowflake;
use reqwest::Method;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Base URL used when no override is configured
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v9";

/// Parameters that scope rate limits independently of the bucket hash
const MAJOR_PARAMETERS: [&str; 4] = ["channel_id", "guild_id", "webhook_id", "webhook_token"];

/// A value substituted into a path template
///
/// Text values are percent-encoded; ids and numbers are embedded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    /// Free-form text (emoji, tokens, names); percent-encoded in the path
    Text(String),
    /// Numeric value embedded as-is
    Raw(String),
}

impl ParamValue {
    /// The value as it appears in the concrete path
    pub fn rendered(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => urlencoding::encode(s),
            Self::Raw(s) => Cow::Borrowed(s),
        }
    }

    /// The unencoded value
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Raw(s) => s,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Snowflake> for ParamValue {
    fn from(value: Snowflake) -> Self {
        Self::Raw(value.to_string())
    }
}

macro_rules! raw_param {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Raw(value.to_string())
                }
            }
        )*
    };
}

raw_param!(u64, i64, u32, i32, u16);

/// One API operation: method, path and the parameters that scope it
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    template: &'static str,
    path: String,
    major_params: Vec<(&'static str, String)>,
    bucket: Option<String>,
}

impl Route {
    /// Create a route for a template with no parameters filled in yet
    pub fn new(method: Method, template: &'static str) -> Self {
        Self {
            method,
            template,
            path: template.to_string(),
            major_params: Vec::new(),
            bucket: None,
        }
    }

    /// Substitute `{name}` in the path with `value`
    ///
    /// Major parameters are remembered in insertion order for the bucket key.
    #[must_use]
    pub fn param(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        let placeholder = format!("{{{name}}}");
        self.path = self.path.replace(&placeholder, &value.rendered());

        if MAJOR_PARAMETERS.contains(&name) {
            self.major_params.push((name, value.as_str().to_string()));
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The unsubstituted path template
    pub fn template(&self) -> &'static str {
        self.template
    }

    /// The concrete path with parameters substituted
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn major_params(&self) -> &[(&'static str, String)] {
        &self.major_params
    }

    /// Full URL against the default API base
    pub fn url(&self) -> String {
        self.url_with_base(DEFAULT_API_BASE)
    }

    /// Full URL against a custom API base
    pub fn url_with_base(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path)
    }

    /// Default bucket key: `METHOD:template:major:params`
    pub fn bucket_key(&self) -> String {
        let majors: Vec<&str> = self.major_params.iter().map(|(_, v)| v.as_str()).collect();
        format!("{}:{}:{}", self.method, self.template, majors.join(":"))
    }

    /// The server-assigned bucket hash if one was learned, else the default key
    pub fn bucket(&self) -> String {
        self.bucket.clone().unwrap_or_else(|| self.bucket_key())
    }

    /// Attach a server-assigned bucket hash
    pub fn set_bucket(&mut self, bucket: impl Into<String>) {
        self.bucket = Some(bucket.into());
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.method == other.method
            && self.major_params == other.major_params
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.method.as_str().hash(state);
        self.major_params.hash(state);
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
