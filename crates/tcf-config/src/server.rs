//! Broker server declarations.
//!
//! Servers are declared in configuration files as tables
//! (`servers = [{ url = "https://tb.example.org:5000", aka = "tb" }]`) or on
//! the command line as `URL` / `AKA=URL` strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Port assumed when a broker URL does not name one.
pub const DEFAULT_BROKER_PORT: u16 = 5000;

/// Declarative configuration for one target broker.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerSpec {
    /// Base URL of the broker.
    pub url: Url,
    /// Short name; derived from the URL host and port when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aka: Option<String>,
    /// Where the declaration came from, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ServerSpec {
    /// Builds a server declaration after validating the URL.
    pub fn new(url: Url, aka: Option<String>) -> Result<Self, ServerParseError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ServerParseError::UnsupportedScheme(url.scheme().to_owned()));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ServerParseError::MissingHost(url.to_string()));
        }
        Ok(Self {
            url,
            aka,
            origin: None,
        })
    }

    /// Host name of the broker URL.
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Short, human-friendly broker name.
    ///
    /// Without an explicit `aka`, this is the first label of the host name
    /// followed by the port, e.g. `tb_5000` for `https://tb.example.org`.
    #[must_use]
    pub fn aka(&self) -> String {
        if let Some(aka) = &self.aka {
            return aka.clone();
        }
        let host = self.hostname().split('.').next().unwrap_or_default();
        let port = self.url.port().unwrap_or(DEFAULT_BROKER_PORT);
        format!("{host}_{port}")
    }

    /// File-name friendly rendering of the URL, used to key state files.
    ///
    /// Drops `:`, `/` and whitespace; lossy, so only good as a file name.
    #[must_use]
    pub fn url_safe(&self) -> String {
        self.url
            .as_str()
            .chars()
            .filter(|c| !matches!(c, ':' | '/') && !c.is_whitespace())
            .collect()
    }
}

impl fmt::Display for ServerSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.aka {
            Some(aka) => write!(formatter, "{aka}={}", self.url),
            None => write!(formatter, "{}", self.url),
        }
    }
}

impl FromStr for ServerSpec {
    type Err = ServerParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (aka, url) = match trimmed.split_once('=') {
            Some((name, rest)) if is_aka(name) => (Some(name.to_owned()), rest),
            _ => (None, trimmed),
        };
        let url = Url::parse(url)?;
        Self::new(url, aka)
    }
}

fn is_aka(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Errors encountered while parsing a [`ServerSpec`] from text.
#[derive(Debug, Error)]
pub enum ServerParseError {
    /// Scheme was not HTTP(S).
    #[error("unsupported broker URL scheme '{0}'")]
    UnsupportedScheme(String),
    /// The URL had no host.
    #[error("missing host in broker URL '{0}'")]
    MissingHost(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
