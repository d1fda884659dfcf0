//! Declarative stub configuration.
//!
//! Stubs can be declared in YAML and loaded into a
//! [`StubRegistry`](crate::StubRegistry) in one call.

use crate::error::{Result, StubError};
use crate::matcher::Matcher;
use crate::request::Method;
use crate::response::{Failure, FailureKind, StubResponse};
use crate::stub::Stub;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A document of stub definitions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StubsConfig {
    /// Stub definitions, in matching order
    #[serde(default)]
    pub stubs: Vec<StubDefinition>,

    /// Registry settings
    #[serde(default)]
    pub settings: Settings,
}

impl StubsConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, stub) in self.stubs.iter().enumerate() {
            stub.to_stub()
                .map_err(|e| anyhow::anyhow!("Stub {}: {}", i, e))?;
        }
        Ok(())
    }

    /// Compile every definition into a [`Stub`].
    pub fn to_stubs(&self) -> Result<Vec<Stub>> {
        self.stubs.iter().map(StubDefinition::to_stub).collect()
    }
}

/// A single stub definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StubDefinition {
    /// HTTP method to match
    pub method: Method,

    /// Exact URL to match
    #[serde(default)]
    pub url: Option<String>,

    /// Regex the URL must match (unanchored)
    #[serde(default)]
    pub url_pattern: Option<String>,

    /// Required request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Body matching
    #[serde(default)]
    pub body: Option<BodyMatcher>,

    /// Response to return
    #[serde(default)]
    pub response: ResponseDefinition,

    /// Failure simulation
    #[serde(default)]
    pub fault: Option<FaultConfig>,
}

impl StubDefinition {
    /// Compile the definition into a [`Stub`].
    pub fn to_stub(&self) -> Result<Stub> {
        let builder = Stub::builder(self.method);
        let builder = match (&self.url, &self.url_pattern) {
            (Some(url), None) => builder.url(url.clone()),
            (None, Some(pattern)) => builder.url_matching(Matcher::regex(pattern)?),
            (None, None) => {
                return Err(StubError::InvalidStub(
                    "one of `url` or `url_pattern` is required".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(StubError::InvalidStub(
                    "`url` and `url_pattern` are mutually exclusive".to_string(),
                ))
            }
        };

        let mut builder = self
            .headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name.clone(), value.clone()));

        if let Some(body) = &self.body {
            builder = builder.body(body.to_matcher()?);
        }

        let response = match &self.fault {
            Some(fault) => fault.to_response(),
            None => self.response.to_response()?,
        };

        Ok(builder.response(response).build())
    }
}

/// Body matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyMatcher {
    /// Exact body match
    Exact { value: String },
    /// Regex pattern match
    Regex { pattern: String },
    /// Exact binary match, base64 encoded
    Base64 { content: String },
    /// Structural JSON equality
    Json { content: serde_json::Value },
}

impl BodyMatcher {
    pub fn to_matcher(&self) -> Result<Matcher> {
        match self {
            BodyMatcher::Exact { value } => Ok(Matcher::exact(value.clone())),
            BodyMatcher::Regex { pattern } => Matcher::regex(pattern),
            BodyMatcher::Base64 { content } => decode_base64(content).map(Matcher::bytes),
            BodyMatcher::Json { content } => Ok(Matcher::json_value(content.clone())),
        }
    }
}

/// Response definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDefinition {
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body
    #[serde(default)]
    pub body: Option<ResponseBody>,
}

fn default_status() -> u16 {
    200
}

impl Default for ResponseDefinition {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl ResponseDefinition {
    pub fn to_response(&self) -> Result<StubResponse> {
        if !(100..=599).contains(&self.status) {
            return Err(StubError::InvalidStub(format!(
                "invalid status code: {}",
                self.status
            )));
        }

        let mut response = self
            .headers
            .iter()
            .fold(StubResponse::new(self.status), |r, (name, value)| {
                r.with_header(name.clone(), value.clone())
            });

        if let Some(body) = &self.body {
            if response.header("content-type").is_none() {
                response = response.with_header("Content-Type", body.content_type());
            }
            response = response.with_body(body.to_bytes()?);
        }

        Ok(response)
    }
}

/// Response body configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBody {
    /// Plain text body
    Text { content: String },
    /// JSON body
    Json { content: serde_json::Value },
    /// Base64 encoded binary
    Base64 { content: String },
}

impl ResponseBody {
    /// Get the body content as bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            ResponseBody::Text { content } => Ok(content.as_bytes().to_vec()),
            ResponseBody::Json { content } => Ok(serde_json::to_vec(content)?),
            ResponseBody::Base64 { content } => decode_base64(content),
        }
    }

    /// Get content type for this body.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseBody::Text { .. } => "text/plain",
            ResponseBody::Json { .. } => "application/json",
            ResponseBody::Base64 { .. } => "application/octet-stream",
        }
    }
}

fn decode_base64(content: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(content)
        .map_err(|e| StubError::InvalidStub(format!("invalid base64: {}", e)))
}

/// Failure simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultConfig {
    /// Kind of failure
    #[serde(rename = "type")]
    pub kind: FailureKind,

    /// Failure description
    #[serde(default)]
    pub message: Option<String>,
}

impl FaultConfig {
    pub fn to_response(&self) -> StubResponse {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("{} (simulated)", self.kind));
        StubResponse::failure(Failure::new(self.kind, message))
    }
}

/// Registry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Log matched requests
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log unmatched requests
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
        }
    }
}
