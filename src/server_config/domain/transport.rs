//! MCP server transport configuration value objects.

use super::ServerConfigDomainError;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Transport settings for an MCP server hosted as a local subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl StdioTransport {
    /// Creates a subprocess transport.
    ///
    /// The command is trimmed but not rejected when blank; probing a blank
    /// command reports a failure instead of dropping the server.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into().trim().to_owned(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces environment overrides applied on top of the host environment.
    #[must_use]
    pub fn with_env(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = values.into_iter().collect();
        self
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment overrides.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

/// Declared flavour of a remote MCP endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpKind {
    /// Streamable HTTP (`"type": "http"`).
    Http,
    /// Server-sent events (`"type": "sse"`).
    Sse,
    /// No explicit type; inferred from a `url` without a `command`.
    Auto,
}

impl HttpKind {
    /// Returns the configuration representation, `None` for [`Self::Auto`].
    #[must_use]
    pub const fn as_type_field(self) -> Option<&'static str> {
        match self {
            Self::Http => Some("http"),
            Self::Sse => Some("sse"),
            Self::Auto => None,
        }
    }

    /// Returns the canonical display representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Sse => "sse",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for HttpKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Transport settings for an MCP server reached over HTTP or SSE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransport {
    url: Url,
    headers: BTreeMap<String, String>,
    kind: HttpKind,
}

impl HttpTransport {
    /// Creates a remote transport.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigDomainError::MissingUrl`] when `url` is blank and
    /// [`ServerConfigDomainError::InvalidUrl`] when it is not an absolute
    /// `http://` or `https://` URI.
    pub fn new(url: &str, kind: HttpKind) -> Result<Self, ServerConfigDomainError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ServerConfigDomainError::MissingUrl);
        }

        let parsed = Url::parse(trimmed).map_err(|err| ServerConfigDomainError::InvalidUrl {
            url: trimmed.to_owned(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServerConfigDomainError::InvalidUrl {
                url: trimmed.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            url: parsed,
            headers: BTreeMap::new(),
            kind,
        })
    }

    /// Replaces the request headers sent with every probe.
    #[must_use]
    pub fn with_headers(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = values.into_iter().collect();
        self
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns configured request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns the declared endpoint flavour.
    #[must_use]
    pub const fn kind(&self) -> HttpKind {
        self.kind
    }
}

/// Supported MCP transport variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTransport {
    /// MCP over a local subprocess's standard streams.
    Stdio(StdioTransport),
    /// MCP over an HTTP or SSE endpoint.
    Http(HttpTransport),
}

impl ServerTransport {
    /// Creates a `stdio` transport.
    #[must_use]
    pub fn stdio(command: impl Into<String>) -> Self {
        Self::Stdio(StdioTransport::new(command))
    }

    /// Creates an `http` transport with an explicit type.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`HttpTransport::new`].
    pub fn http(url: &str) -> Result<Self, ServerConfigDomainError> {
        Ok(Self::Http(HttpTransport::new(url, HttpKind::Http)?))
    }

    /// Returns a short transport label used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Stdio(_) => "stdio",
            Self::Http(transport) => transport.kind().as_str(),
        }
    }
}
