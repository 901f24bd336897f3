//! Connection options.
//!
//! Options are an open key-value map handed to whichever primitive a plugin
//! ends up calling. Only the keys below are interpreted; everything else is
//! carried through untouched for plugins that want it.
//!
//! | key | meaning |
//! |---|---|
//! | `method` | HTTP method (`GET` for reads, `POST` for writes when unset) |
//! | `header.<Name>` | HTTP request header |
//! | `timeout` | HTTP request timeout (`"30"`, `"30s"`, `"5m"`, `"1h"`) |
//! | `protocol`, `host`, `port`, `path` | override parts of the parsed URL |
//! | `buffer_size` | file read chunk capacity |
//! | `append` | append to the output file instead of truncating |
//! | `compression` | `auto` (by suffix), `gzip`, or `none` |

mod duration;

pub use duration::parse_duration;

use crate::error::{Error, Result};
use feature_stream_file::{FileOptions, HttpRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Prefix marking header entries, e.g. `header.Authorization`.
pub const HEADER_PREFIX: &str = "header.";

/// Whether a file connection is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// Decide from the `.gz` / `.gzip` suffix
    Auto,
    Gzip,
    None,
}

/// Open key-value configuration for one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, RawValue>")]
pub struct ConnectionOptions {
    values: BTreeMap<String, String>,
}

/// Scalar accepted in option files; everything is kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<BTreeMap<String, RawValue>> for ConnectionOptions {
    fn from(raw: BTreeMap<String, RawValue>) -> Self {
        let values = raw
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    RawValue::Text(s) => s,
                    RawValue::Integer(i) => i.to_string(),
                    RawValue::Float(f) => f.to_string(),
                    RawValue::Bool(b) => b.to_string(),
                };
                (key, text)
            })
            .collect();
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay `other` on top of these options; `other` wins on conflicts.
    pub fn merge(mut self, other: &ConnectionOptions) -> Self {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
        self
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|e| Error::invalid_option(key, value, e))
            })
            .transpose()
    }

    /// HTTP method, or `default` when unset.
    pub fn method(&self, default: Method) -> Result<Method> {
        match self.get("method") {
            Some(value) => Method::from_bytes(value.trim().to_ascii_uppercase().as_bytes())
                .map_err(|e| Error::invalid_option("method", value, e)),
            None => Ok(default),
        }
    }

    /// Request headers from every `header.<Name>` entry.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (key, value) in self.iter() {
            let Some(name) = key.strip_prefix(HEADER_PREFIX) else {
                continue;
            };
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_option(key, value, e))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| Error::invalid_option(key, value, e))?;
            headers.append(name, value);
        }
        Ok(headers)
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.get("timeout")
            .map(|value| parse_duration(value).map_err(|e| Error::invalid_option("timeout", value, e)))
            .transpose()
    }

    pub fn compression(&self) -> Result<CompressionMode> {
        match self.get("compression").map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(CompressionMode::Auto),
            Some(mode) => match mode.as_str() {
                "auto" => Ok(CompressionMode::Auto),
                "gzip" | "gz" => Ok(CompressionMode::Gzip),
                "none" | "off" => Ok(CompressionMode::None),
                _ => Err(Error::invalid_option(
                    "compression",
                    &mode,
                    "expected 'auto', 'gzip' or 'none'",
                )),
            },
        }
    }

    /// Options for the local file primitives.
    pub fn file_options(&self) -> Result<FileOptions> {
        let defaults = FileOptions::default();
        Ok(FileOptions {
            buffer_size: self.parse("buffer_size")?.unwrap_or(defaults.buffer_size),
            append: self.parse("append")?.unwrap_or(defaults.append),
        })
    }

    /// Build an outbound request for `id`, with option fields overriding the
    /// parts of the parsed URL they name.
    pub fn http_request(&self, id: &str, default_method: Method) -> Result<HttpRequest> {
        let mut url = Url::parse(id).map_err(|e| Error::invalid_option("url", id, e))?;
        if let Some(protocol) = self.get("protocol") {
            let scheme = protocol.trim_end_matches(':');
            url.set_scheme(scheme)
                .map_err(|()| Error::invalid_option("protocol", protocol, "cannot apply scheme"))?;
        }
        if let Some(host) = self.get("host") {
            url.set_host(Some(host))
                .map_err(|e| Error::invalid_option("host", host, e))?;
        }
        if let Some(port) = self.parse::<u16>("port")? {
            url.set_port(Some(port))
                .map_err(|()| Error::invalid_option("port", &port.to_string(), "cannot apply port"))?;
        }
        if let Some(path) = self.get("path") {
            match path.split_once('?') {
                Some((path, query)) => {
                    url.set_path(path);
                    url.set_query(Some(query));
                }
                None => url.set_path(path),
            }
        }

        let mut request = HttpRequest::new(self.method(default_method)?, url);
        request.headers = self.headers()?;
        request.timeout = self.timeout()?;
        Ok(request)
    }
}

/// Parse a `key=value` command-line option.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
